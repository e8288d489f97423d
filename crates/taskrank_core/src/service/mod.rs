//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate record and store calls into use-case level APIs.
//! - Keep host layers decoupled from storage details.

pub mod task_service;
