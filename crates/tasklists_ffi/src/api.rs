//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose list/task use-cases to Dart via FRB as sync functions.
//! - Translate core results into flat response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - IDs cross the boundary as UUID strings.
//! - Statuses cross as a kind label plus a numeric pending count; the UI
//!   owns all formatting.
//! - Every call opens its own connection and store; SQLite's busy timeout
//!   serializes concurrent writers.

use log::warn;
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tasklists_core::db::open_db;
use tasklists_core::{
    classify, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, DefaultClock, ListOrder, SqliteTaskRepository, StoreError, Task, TaskList,
    TaskStore,
};
use uuid::Uuid;

const DB_FILE_NAME: &str = "tasklists.sqlite3";
const DB_PATH_ENV: &str = "TASKLISTS_DB_PATH";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Exposes core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and the error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One row of the list overview screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListItem {
    pub list_id: String,
    pub name: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// `empty|in_progress|all_done`.
    pub status: String,
    /// Incomplete task count; zero unless `status == "in_progress"`.
    pub pending_count: u32,
    pub task_count: u32,
}

/// One task row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub task_id: String,
    pub list_id: String,
    pub name: String,
    pub note: String,
    pub is_complete: bool,
    pub created_at: i64,
    pub status_changed_at: Option<i64>,
}

/// Response envelope for the list overview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListsResponse {
    pub ok: bool,
    pub items: Vec<TaskListItem>,
    /// `not_found|storage_failure|invalid_argument` on failure.
    pub error_kind: Option<String>,
    pub message: String,
}

/// Response envelope for the task screen sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSectionsResponse {
    pub ok: bool,
    /// Incomplete tasks, oldest first.
    pub current: Vec<TaskItem>,
    /// Complete tasks, most recently completed first.
    pub completed: Vec<TaskItem>,
    pub error_kind: Option<String>,
    pub message: String,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    /// ID of the created or affected entity.
    pub id: Option<String>,
    pub error_kind: Option<String>,
    pub message: String,
}

impl ActionResponse {
    fn success(message: impl Into<String>, id: String) -> Self {
        Self {
            ok: true,
            id: Some(id),
            error_kind: None,
            message: message.into(),
        }
    }

    fn failure(op: &str, err: &FfiError) -> Self {
        Self {
            ok: false,
            id: None,
            error_kind: Some(err.kind().to_string()),
            message: format!("{op} failed: {err}"),
        }
    }
}

/// Lists every task list with its status, sorted by `sort` (`created|name`).
#[flutter_rust_bridge::frb(sync)]
pub fn task_lists(sort: String) -> TaskListsResponse {
    let result = parse_list_order(sort.as_str())
        .and_then(|order| with_store("task_lists", |store| store.list_lists(order)));
    match result {
        Ok(lists) => {
            let items: Vec<TaskListItem> = lists.iter().map(to_task_list_item).collect();
            let message = format!("Loaded {} list(s).", items.len());
            TaskListsResponse {
                ok: true,
                items,
                error_kind: None,
                message,
            }
        }
        Err(err) => TaskListsResponse {
            ok: false,
            items: Vec::new(),
            error_kind: Some(err.kind().to_string()),
            message: format!("task_lists failed: {err}"),
        },
    }
}

/// Creates an empty list. Empty names are accepted.
#[flutter_rust_bridge::frb(sync)]
pub fn create_list(name: String) -> ActionResponse {
    match with_store("create_list", |store| store.create_list(name)) {
        Ok(list) => ActionResponse::success("List created.", list.list_id.to_string()),
        Err(err) => ActionResponse::failure("create_list", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn rename_list(list_id: String, name: String) -> ActionResponse {
    run_action("rename_list", "List renamed.", list_id, |store, id| {
        store.rename_list(id, name.as_str())
    })
}

/// Deletes a list together with all of its tasks.
#[flutter_rust_bridge::frb(sync)]
pub fn delete_list(list_id: String) -> ActionResponse {
    run_action("delete_list", "List deleted.", list_id, |store, id| {
        store.delete_list(id)
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn complete_all_tasks(list_id: String) -> ActionResponse {
    run_action(
        "complete_all_tasks",
        "All tasks completed.",
        list_id,
        |store, id| store.complete_all_tasks(id),
    )
}

/// Appends a task to a list and returns the new task ID.
#[flutter_rust_bridge::frb(sync)]
pub fn add_task(list_id: String, name: String, note: String) -> ActionResponse {
    let result = parse_id(list_id.as_str())
        .and_then(|id| with_store("add_task", |store| store.add_task(id, name, note)));
    match result {
        Ok(task) => ActionResponse::success("Task created.", task.task_id.to_string()),
        Err(err) => ActionResponse::failure("add_task", &err),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn update_task(task_id: String, name: String, note: String) -> ActionResponse {
    run_action("update_task", "Task updated.", task_id, |store, id| {
        store.update_task(id, name.as_str(), note.as_str())
    })
}

#[flutter_rust_bridge::frb(sync)]
pub fn delete_task(task_id: String) -> ActionResponse {
    run_action("delete_task", "Task deleted.", task_id, |store, id| {
        store.delete_task(id)
    })
}

/// Flips task completion (the done/undone swipe action).
#[flutter_rust_bridge::frb(sync)]
pub fn toggle_task(task_id: String) -> ActionResponse {
    run_action("toggle_task", "Task toggled.", task_id, |store, id| {
        store.toggle_task_completion(id).map(|_| ())
    })
}

/// Loads current and completed task sections of one list.
#[flutter_rust_bridge::frb(sync)]
pub fn task_sections(list_id: String) -> TaskSectionsResponse {
    let result = parse_id(list_id.as_str())
        .and_then(|id| with_store("task_sections", |store| store.task_sections(id)));
    match result {
        Ok(sections) => TaskSectionsResponse {
            ok: true,
            current: sections.current.iter().map(to_task_item).collect(),
            completed: sections.completed.iter().map(to_task_item).collect(),
            error_kind: None,
            message: String::new(),
        },
        Err(err) => TaskSectionsResponse {
            ok: false,
            current: Vec::new(),
            completed: Vec::new(),
            error_kind: Some(err.kind().to_string()),
            message: format!("task_sections failed: {err}"),
        },
    }
}

#[derive(Debug)]
enum FfiError {
    InvalidArgument(String),
    Open(String),
    Store(StoreError),
}

impl FfiError {
    fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Open(_) => "storage_failure",
            Self::Store(StoreError::NotFound(_)) => "not_found",
            Self::Store(StoreError::StorageFailure(_)) => "storage_failure",
        }
    }
}

impl Display for FfiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidArgument(message) => write!(f, "{message}"),
            Self::Open(message) => write!(f, "{message}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

fn run_action(
    op: &'static str,
    success_message: &'static str,
    raw_id: String,
    f: impl FnOnce(&TaskStore<SqliteTaskRepository<'_>>, Uuid) -> tasklists_core::StoreResult<()>,
) -> ActionResponse {
    let result = parse_id(raw_id.as_str())
        .and_then(|id| with_store(op, |store| f(store, id)).map(|()| id));
    match result {
        Ok(id) => ActionResponse::success(success_message, id.to_string()),
        Err(err) => ActionResponse::failure(op, &err),
    }
}

fn with_store<T>(
    op: &'static str,
    f: impl FnOnce(&TaskStore<SqliteTaskRepository<'_>>) -> tasklists_core::StoreResult<T>,
) -> Result<T, FfiError> {
    let conn = open_connection()?;
    let repo = SqliteTaskRepository::try_new(&conn)
        .map_err(|err| FfiError::Open(format!("repository init failed: {err}")))?;
    let store = TaskStore::new(repo, Arc::new(DefaultClock));
    f(&store).map_err(|err| {
        warn!(
            "event=ffi_call module=ffi status=error op={} error_kind={}",
            op,
            if err.is_not_found() {
                "not_found"
            } else {
                "storage_failure"
            }
        );
        FfiError::Store(err)
    })
}

fn open_connection() -> Result<Connection, FfiError> {
    open_db(resolve_db_path()).map_err(|err| FfiError::Open(format!("DB open failed: {err}")))
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn parse_id(raw: &str) -> Result<Uuid, FfiError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| FfiError::InvalidArgument(format!("invalid id `{raw}`")))
}

fn parse_list_order(raw: &str) -> Result<ListOrder, FfiError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "created" | "date" => Ok(ListOrder::CreatedAt),
        "name" => Ok(ListOrder::Name),
        other => Err(FfiError::InvalidArgument(format!(
            "unsupported sort `{other}`; expected created|name"
        ))),
    }
}

fn to_task_list_item(list: &TaskList) -> TaskListItem {
    let status = classify(list);
    TaskListItem {
        list_id: list.list_id.to_string(),
        name: list.name.clone(),
        created_at: list.created_at,
        status: status.kind_label().to_string(),
        pending_count: saturating_u32(status.pending_count()),
        task_count: saturating_u32(list.tasks.len()),
    }
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        task_id: task.task_id.to_string(),
        list_id: task.list_id.to_string(),
        name: task.name.clone(),
        note: task.note.clone(),
        is_complete: task.is_complete,
        created_at: task.created_at,
        status_changed_at: task.status_changed_at,
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        add_task, complete_all_tasks, core_version, create_list, delete_list, init_logging, ping,
        rename_list, task_lists, task_sections, toggle_task, update_task,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn created_list_shows_up_with_status_in_overview() {
        let name = unique_token("overview");
        let created = create_list(name.clone());
        assert!(created.ok, "{}", created.message);
        let list_id = created.id.expect("create_list should return id");

        let task = add_task(list_id.clone(), "Milk".to_string(), String::new());
        assert!(task.ok, "{}", task.message);

        let response = task_lists("name".to_string());
        assert!(response.ok, "{}", response.message);
        let item = response
            .items
            .iter()
            .find(|item| item.list_id == list_id)
            .expect("created list should be listed");
        assert_eq!(item.name, name);
        assert_eq!(item.status, "in_progress");
        assert_eq!(item.pending_count, 1);
        assert_eq!(item.task_count, 1);

        assert!(complete_all_tasks(list_id.clone()).ok);
        let done = task_lists("created".to_string());
        let item = done
            .items
            .iter()
            .find(|item| item.list_id == list_id)
            .expect("list still listed");
        assert_eq!(item.status, "all_done");
        assert_eq!(item.pending_count, 0);
    }

    #[test]
    fn toggle_moves_task_between_sections() {
        let list_id = create_list(unique_token("sections")).id.expect("list id");
        let task_id = add_task(list_id.clone(), "Bread".to_string(), "rye".to_string())
            .id
            .expect("task id");

        assert!(toggle_task(task_id.clone()).ok);
        let sections = task_sections(list_id.clone());
        assert!(sections.ok, "{}", sections.message);
        assert!(sections.current.is_empty());
        assert_eq!(sections.completed.len(), 1);
        assert_eq!(sections.completed[0].task_id, task_id);
        assert!(sections.completed[0].status_changed_at.is_some());

        assert!(update_task(task_id.clone(), "Bagels".to_string(), String::new()).ok);
        assert!(toggle_task(task_id.clone()).ok);
        let sections = task_sections(list_id);
        assert_eq!(sections.current.len(), 1);
        assert_eq!(sections.current[0].name, "Bagels");
    }

    #[test]
    fn unknown_and_malformed_ids_report_error_kind() {
        let missing = rename_list(
            "00000000-0000-4000-8000-00000000dead".to_string(),
            "x".to_string(),
        );
        assert!(!missing.ok);
        assert_eq!(missing.error_kind.as_deref(), Some("not_found"));

        let malformed = delete_list("not-an-id".to_string());
        assert!(!malformed.ok);
        assert_eq!(malformed.error_kind.as_deref(), Some("invalid_argument"));
    }

    #[test]
    fn action_response_returns_canonical_id() {
        let list_id = create_list(unique_token("canonical")).id.expect("list id");
        let padded = format!("  {}\n", list_id.to_ascii_uppercase());

        let renamed = rename_list(padded, unique_token("renamed"));
        assert!(renamed.ok, "{}", renamed.message);
        assert_eq!(renamed.id.as_deref(), Some(list_id.as_str()));
    }

    #[test]
    fn unsupported_sort_is_rejected() {
        let response = task_lists("priority".to_string());
        assert!(!response.ok);
        assert_eq!(response.error_kind.as_deref(), Some("invalid_argument"));
    }

    #[test]
    fn deleted_list_disappears_from_overview() {
        let list_id = create_list(unique_token("delete")).id.expect("list id");
        assert!(delete_list(list_id.clone()).ok);

        let response = task_lists(String::new());
        assert!(response.items.iter().all(|item| item.list_id != list_id));
        assert_eq!(
            task_sections(list_id).error_kind.as_deref(),
            Some("not_found")
        );
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
