//! Task domain model.
//!
//! # Responsibility
//! - Define the versioned task field schema and its typed access keys.
//! - Define the task record entity and its derived properties.
//!
//! # Invariants
//! - The field schema is immutable process-wide state.
//! - Records change only through typed setters writing the pending layer.

pub mod clock;
pub mod field;
pub mod importance;
pub mod task;
