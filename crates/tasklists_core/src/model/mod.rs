//! Task-list domain model.
//!
//! # Responsibility
//! - Define the canonical list/task records shared by store and UI layers.
//! - Provide the pure status classifier over a list's tasks.
//!
//! # Invariants
//! - Every list and task is identified by a stable UUID.
//! - A task belongs to exactly one list (`Task::list_id`).
//! - Deletion is physical; there are no tombstones.

pub mod status;
pub mod task_list;
