//! Core domain logic for TaskLists.
//! This crate is the single source of truth for list/task invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::status::{classify, ListStatus};
pub use model::task_list::{Task, TaskDraft, TaskId, TaskList, TaskListDraft, TaskListId};
pub use repo::task_repo::{
    CompletionFilter, ListOrder, RepoError, RepoResult, SqliteTaskRepository, TaskOrder,
    TaskQuery, TaskRepository, TaskSections,
};
pub use service::task_store::{EntityRef, StoreError, StoreResult, TaskStore};

pub use mockable::{Clock, DefaultClock};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
