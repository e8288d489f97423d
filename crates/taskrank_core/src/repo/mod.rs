//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the row-level task store contract.
//! - Isolate SQLite query details from records and services.
//!
//! # Invariants
//! - Store APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod task_store;
