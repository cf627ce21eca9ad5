//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the persistence contract the task store depends on.
//! - Isolate SQLite query details from use-case orchestration.
//!
//! # Invariants
//! - Every repository write runs in exactly one scoped transaction.
//! - Reads made of several statements share one read transaction.
//! - Repository APIs return semantic errors (`ListNotFound`, `TaskNotFound`)
//!   in addition to DB transport errors.

pub mod task_repo;
