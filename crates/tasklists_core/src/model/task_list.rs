//! Task list and task records.
//!
//! # Responsibility
//! - Define `TaskList` and `Task` with their identity and timestamps.
//! - Provide constructors used by the store and by bulk import.
//!
//! # Invariants
//! - `created_at` is set once at construction and never changes.
//! - `Task::status_changed_at` is `None` until the first completion change.
//! - `TaskList::tasks` is kept in insertion order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a task list.
pub type TaskListId = Uuid;

/// Stable identifier of a task.
pub type TaskId = Uuid;

/// Named, ordered collection of tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskList {
    pub list_id: TaskListId,
    /// User-facing name. May be empty; the core does not validate it.
    pub name: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Owned tasks in insertion order.
    pub tasks: Vec<Task>,
}

impl TaskList {
    /// Creates an empty list with a generated ID.
    pub fn new(name: impl Into<String>, created_at: i64) -> Self {
        Self::with_id(Uuid::new_v4(), name, created_at)
    }

    /// Creates an empty list with a caller-provided ID.
    pub fn with_id(list_id: TaskListId, name: impl Into<String>, created_at: i64) -> Self {
        Self {
            list_id,
            name: name.into(),
            created_at,
            tasks: Vec::new(),
        }
    }

    /// Number of tasks that are not complete yet.
    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|task| !task.is_complete).count()
    }

    pub fn find_task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|task| task.task_id == task_id)
    }
}

/// Single to-do item owned by one list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: TaskId,
    /// Owning list.
    pub list_id: TaskListId,
    pub name: String,
    /// Free-form note, empty by default.
    pub note: String,
    pub is_complete: bool,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Epoch ms of the latest completion toggle or set, in either direction.
    pub status_changed_at: Option<i64>,
}

impl Task {
    /// Creates an incomplete task with a generated ID.
    pub fn new(
        list_id: TaskListId,
        name: impl Into<String>,
        note: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            task_id: Uuid::new_v4(),
            list_id,
            name: name.into(),
            note: note.into(),
            is_complete: false,
            created_at,
            status_changed_at: None,
        }
    }

    /// Timestamp used to order completed tasks (latest first).
    pub fn completion_sort_key(&self) -> i64 {
        self.status_changed_at.unwrap_or(self.created_at)
    }
}

/// Input shape for bulk list import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskListDraft {
    pub name: String,
    pub tasks: Vec<TaskDraft>,
}

/// Input shape for one task inside a `TaskListDraft`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    pub name: String,
    pub note: String,
    pub is_complete: bool,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            note: note.into(),
            is_complete: false,
        }
    }

    pub fn completed(mut self) -> Self {
        self.is_complete = true;
        self
    }
}

impl TaskListDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tasks: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: TaskDraft) -> Self {
        self.tasks.push(task);
        self
    }

    /// Materializes the draft into a list stamped with `created_at`.
    ///
    /// Tasks keep draft order and share the list timestamp.
    pub fn into_task_list(self, created_at: i64) -> TaskList {
        let mut list = TaskList::new(self.name, created_at);
        let list_id = list.list_id;
        list.tasks = self
            .tasks
            .into_iter()
            .map(|draft| {
                let mut task = Task::new(list_id, draft.name, draft.note, created_at);
                task.is_complete = draft.is_complete;
                task
            })
            .collect();
        list
    }
}
