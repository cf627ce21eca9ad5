//! Task store use-case service.
//!
//! # Responsibility
//! - Own every list/task mutation exposed to UI callers.
//! - Stamp timestamps from an injected clock.
//! - Map repository errors to the two caller-facing kinds: not-found and
//!   storage failure.
//!
//! # Invariants
//! - Each operation performs exactly one repository write, so it is applied
//!   fully or not at all.
//! - Storage failures are returned to the caller and logged, never dropped.
//! - The store is an explicit value owned by the caller; there is no
//!   process-wide instance.

use crate::model::status::{classify, ListStatus};
use crate::model::task_list::{Task, TaskId, TaskList, TaskListDraft, TaskListId};
use crate::repo::task_repo::{
    ListOrder, RepoError, RepoResult, TaskQuery, TaskRepository, TaskSections,
};
use log::{debug, error};
use mockable::{Clock, DefaultClock};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type StoreResult<T> = Result<T, StoreError>;

/// Entity referenced by a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    TaskList(TaskListId),
    Task(TaskId),
}

impl Display for EntityRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TaskList(id) => write!(f, "task list {id}"),
            Self::Task(id) => write!(f, "task {id}"),
        }
    }
}

/// Errors returned by `TaskStore` operations.
#[derive(Debug)]
pub enum StoreError {
    /// Referenced list or task does not exist. Usually stale UI state.
    NotFound(EntityRef),
    /// Persistence layer failed; the operation was rolled back.
    StorageFailure(RepoError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity) => write!(f, "not found: {entity}"),
            Self::StorageFailure(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotFound(_) => None,
            Self::StorageFailure(err) => Some(err),
        }
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ListNotFound(id) => Self::NotFound(EntityRef::TaskList(id)),
            RepoError::TaskNotFound(id) => Self::NotFound(EntityRef::Task(id)),
            other => Self::StorageFailure(other),
        }
    }
}

/// Task-list store facade over a repository implementation.
///
/// Timestamps are epoch milliseconds taken from `clock.utc()`.
pub struct TaskStore<R, C = DefaultClock>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    repo: R,
    clock: Arc<C>,
}

impl<R, C> TaskStore<R, C>
where
    R: TaskRepository,
    C: Clock + Send + Sync,
{
    pub fn new(repo: R, clock: Arc<C>) -> Self {
        Self { repo, clock }
    }

    fn now_ms(&self) -> i64 {
        self.clock.utc().timestamp_millis()
    }

    /// Creates and stores an empty list named `name`.
    pub fn create_list(&self, name: impl Into<String>) -> StoreResult<TaskList> {
        let list = TaskList::new(name, self.now_ms());
        observe("create_list", self.repo.insert_lists(std::slice::from_ref(&list)))?;
        debug!(
            "event=list_create module=store status=ok list_id={}",
            list.list_id
        );
        Ok(list)
    }

    /// Stores many lists with their tasks in one transaction.
    ///
    /// Every imported list shares the same `created_at`; insertion order
    /// breaks ties when sorting by creation time.
    pub fn import_lists(&self, drafts: Vec<TaskListDraft>) -> StoreResult<Vec<TaskList>> {
        let created_at = self.now_ms();
        let lists: Vec<TaskList> = drafts
            .into_iter()
            .map(|draft| draft.into_task_list(created_at))
            .collect();
        observe("import_lists", self.repo.insert_lists(&lists))?;
        debug!(
            "event=list_import module=store status=ok count={}",
            lists.len()
        );
        Ok(lists)
    }

    pub fn rename_list(&self, list_id: TaskListId, new_name: &str) -> StoreResult<()> {
        observe("rename_list", self.repo.rename_list(list_id, new_name))
    }

    /// Deletes the list and every task it owns.
    pub fn delete_list(&self, list_id: TaskListId) -> StoreResult<()> {
        observe("delete_list", self.repo.delete_list(list_id))?;
        debug!("event=list_delete module=store status=ok list_id={list_id}");
        Ok(())
    }

    /// Marks every task of the list complete. Timestamps are left untouched.
    pub fn complete_all_tasks(&self, list_id: TaskListId) -> StoreResult<()> {
        observe("complete_all_tasks", self.repo.complete_all_tasks(list_id))
    }

    pub fn get_list(&self, list_id: TaskListId) -> StoreResult<TaskList> {
        observe("get_list", self.repo.get_list(list_id))?
            .ok_or(StoreError::NotFound(EntityRef::TaskList(list_id)))
    }

    /// Returns all lists, each with tasks in insertion order.
    pub fn list_lists(&self, order: ListOrder) -> StoreResult<Vec<TaskList>> {
        observe("list_lists", self.repo.list_lists(order))
    }

    /// Loads the list and classifies it.
    pub fn list_status(&self, list_id: TaskListId) -> StoreResult<ListStatus> {
        self.get_list(list_id).map(|list| classify(&list))
    }

    /// Appends an incomplete task to the end of the list.
    pub fn add_task(
        &self,
        list_id: TaskListId,
        name: impl Into<String>,
        note: impl Into<String>,
    ) -> StoreResult<Task> {
        let task = Task::new(list_id, name, note, self.now_ms());
        observe("add_task", self.repo.insert_task(&task))?;
        debug!(
            "event=task_create module=store status=ok list_id={} task_id={}",
            list_id, task.task_id
        );
        Ok(task)
    }

    /// Replaces name and note. Completion state and timestamps are kept.
    pub fn update_task(&self, task_id: TaskId, new_name: &str, new_note: &str) -> StoreResult<()> {
        observe(
            "update_task",
            self.repo.update_task_content(task_id, new_name, new_note),
        )
    }

    pub fn delete_task(&self, task_id: TaskId) -> StoreResult<()> {
        observe("delete_task", self.repo.delete_task(task_id))
    }

    /// Flips completion and stamps `status_changed_at` in either direction.
    pub fn toggle_task_completion(&self, task_id: TaskId) -> StoreResult<Task> {
        let changed_at = self.now_ms();
        observe(
            "toggle_task_completion",
            self.repo.toggle_task_completion(task_id, changed_at),
        )
    }

    /// Sets completion to `is_complete`; stamps `status_changed_at` even when
    /// the flag already had that value.
    pub fn set_task_completion(&self, task_id: TaskId, is_complete: bool) -> StoreResult<Task> {
        let changed_at = self.now_ms();
        observe(
            "set_task_completion",
            self.repo
                .set_task_completion(task_id, is_complete, changed_at),
        )
    }

    pub fn get_task(&self, task_id: TaskId) -> StoreResult<Task> {
        observe("get_task", self.repo.get_task(task_id))?
            .ok_or(StoreError::NotFound(EntityRef::Task(task_id)))
    }

    /// Pull-based task query for one list.
    pub fn list_tasks(&self, list_id: TaskListId, query: &TaskQuery) -> StoreResult<Vec<Task>> {
        observe("list_tasks", self.repo.list_tasks(list_id, query))
    }

    /// Splits the list's tasks into current and completed display sections.
    ///
    /// Both sections are read from the same snapshot.
    pub fn task_sections(&self, list_id: TaskListId) -> StoreResult<TaskSections> {
        observe("task_sections", self.repo.task_sections(list_id))
    }
}

fn observe<T>(op: &'static str, result: RepoResult<T>) -> StoreResult<T> {
    result.map_err(|err| {
        let mapped = StoreError::from(err);
        if let StoreError::StorageFailure(inner) = &mapped {
            error!(
                "event=store_op module=store status=error op={} error_code=storage_failure error={}",
                op, inner
            );
        }
        mapped
    })
}
