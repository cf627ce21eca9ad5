//! Task list repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD and query APIs over `task_lists` and `tasks` storage.
//! - Keep SQL details and ordering rules inside the persistence boundary.
//!
//! # Invariants
//! - Every write runs inside `run_in_transaction`; a failed write leaves no
//!   partial state behind.
//! - Reads spanning several statements run inside `run_read_transaction`.
//! - Task lists come back with tasks in insertion (`position`) order.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::migrations::latest_version;
use crate::db::{run_in_transaction, run_read_transaction, DbError};
use crate::model::task_list::{Task, TaskId, TaskList, TaskListId};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const TASK_SELECT_SQL: &str = "SELECT
    task_uuid,
    list_uuid,
    name,
    note,
    is_complete,
    created_at,
    status_changed_at
FROM tasks";

const LIST_SELECT_SQL: &str = "SELECT
    list_uuid,
    name,
    created_at
FROM task_lists";

pub type RepoResult<T> = Result<T, RepoError>;

/// Errors from task repository operations.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Target list does not exist.
    ListNotFound(TaskListId),
    /// Target task does not exist.
    TaskNotFound(TaskId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "task list not found: {id}"),
            Self::TaskNotFound(id) => write!(f, "task not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "task repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "task repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "task repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted task data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ordering applied to the collection of lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// `created_at` ascending, insertion order on ties.
    #[default]
    CreatedAt,
    /// `name` ascending (byte-wise), `created_at` on ties.
    Name,
}

/// Completion filter for task queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompletionFilter {
    #[default]
    All,
    /// Only incomplete tasks.
    Current,
    /// Only complete tasks.
    Completed,
}

/// Ordering for task queries inside one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskOrder {
    /// Canonical insertion order.
    #[default]
    Insertion,
    /// `created_at` ascending, insertion order on ties.
    CreatedAsc,
    /// Latest completion change first, falling back to `created_at`.
    CompletedDesc,
}

/// Query options for listing tasks of one list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: CompletionFilter,
    pub order: TaskOrder,
}

/// Display partitions of one list's tasks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskSections {
    /// Incomplete tasks, oldest first.
    pub current: Vec<Task>,
    /// Complete tasks, most recently completed first.
    pub completed: Vec<Task>,
}

/// Persistence contract used by `TaskStore`.
pub trait TaskRepository {
    /// Inserts lists with their tasks; all-or-nothing.
    fn insert_lists(&self, lists: &[TaskList]) -> RepoResult<()>;
    fn rename_list(&self, list_id: TaskListId, name: &str) -> RepoResult<()>;
    /// Deletes one list and every task it owns.
    fn delete_list(&self, list_id: TaskListId) -> RepoResult<()>;
    /// Sets `is_complete` on every task of the list without touching timestamps.
    fn complete_all_tasks(&self, list_id: TaskListId) -> RepoResult<()>;
    fn get_list(&self, list_id: TaskListId) -> RepoResult<Option<TaskList>>;
    fn list_lists(&self, order: ListOrder) -> RepoResult<Vec<TaskList>>;
    /// Appends one task at the end of its list's insertion order.
    fn insert_task(&self, task: &Task) -> RepoResult<()>;
    fn update_task_content(&self, task_id: TaskId, name: &str, note: &str) -> RepoResult<()>;
    fn delete_task(&self, task_id: TaskId) -> RepoResult<()>;
    /// Flips `is_complete` and stamps `status_changed_at`.
    fn toggle_task_completion(&self, task_id: TaskId, changed_at: i64) -> RepoResult<Task>;
    /// Sets `is_complete` to `is_complete` and stamps `status_changed_at`.
    fn set_task_completion(
        &self,
        task_id: TaskId,
        is_complete: bool,
        changed_at: i64,
    ) -> RepoResult<Task>;
    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<Task>>;
    /// Lists tasks of one list; `ListNotFound` when the list is missing.
    fn list_tasks(&self, list_id: TaskListId, query: &TaskQuery) -> RepoResult<Vec<Task>>;
    /// Loads current and completed sections from the same snapshot.
    fn task_sections(&self, list_id: TaskListId) -> RepoResult<TaskSections>;
}

/// SQLite-backed task repository.
pub struct SqliteTaskRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteTaskRepository<'conn> {
    /// Creates repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_task_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl TaskRepository for SqliteTaskRepository<'_> {
    fn insert_lists(&self, lists: &[TaskList]) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            for list in lists {
                tx.execute(
                    "INSERT INTO task_lists (list_uuid, name, created_at)
                     VALUES (?1, ?2, ?3);",
                    params![list.list_id.to_string(), list.name.as_str(), list.created_at],
                )?;
                for (position, task) in list.tasks.iter().enumerate() {
                    insert_task_row(tx, task, position as i64)?;
                }
            }
            Ok(())
        })
    }

    fn rename_list(&self, list_id: TaskListId, name: &str) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            let changed = tx.execute(
                "UPDATE task_lists SET name = ?2 WHERE list_uuid = ?1;",
                params![list_id.to_string(), name],
            )?;
            if changed == 0 {
                return Err(RepoError::ListNotFound(list_id));
            }
            Ok(())
        })
    }

    fn delete_list(&self, list_id: TaskListId) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            tx.execute(
                "DELETE FROM tasks WHERE list_uuid = ?1;",
                [list_id.to_string()],
            )?;
            let changed = tx.execute(
                "DELETE FROM task_lists WHERE list_uuid = ?1;",
                [list_id.to_string()],
            )?;
            if changed == 0 {
                return Err(RepoError::ListNotFound(list_id));
            }
            Ok(())
        })
    }

    fn complete_all_tasks(&self, list_id: TaskListId) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            ensure_list_exists(tx, list_id)?;
            tx.execute(
                "UPDATE tasks SET is_complete = 1 WHERE list_uuid = ?1;",
                [list_id.to_string()],
            )?;
            Ok(())
        })
    }

    fn get_list(&self, list_id: TaskListId) -> RepoResult<Option<TaskList>> {
        run_read_transaction(self.conn, |tx| {
            let row = tx
                .query_row(
                    &format!("{LIST_SELECT_SQL} WHERE list_uuid = ?1;"),
                    [list_id.to_string()],
                    |row| {
                        Ok((
                            row.get::<_, String>("list_uuid")?,
                            row.get::<_, String>("name")?,
                            row.get::<_, i64>("created_at")?,
                        ))
                    },
                )
                .optional()?;

            let Some((uuid_text, name, created_at)) = row else {
                return Ok(None);
            };
            let mut list = TaskList::with_id(
                parse_uuid(&uuid_text, "task_lists.list_uuid")?,
                name,
                created_at,
            );
            list.tasks = query_tasks(tx, list.list_id, &TaskQuery::default())?;
            Ok(Some(list))
        })
    }

    fn list_lists(&self, order: ListOrder) -> RepoResult<Vec<TaskList>> {
        let order_sql = match order {
            ListOrder::CreatedAt => "ORDER BY created_at ASC, rowid ASC",
            ListOrder::Name => "ORDER BY name ASC, created_at ASC, rowid ASC",
        };
        run_read_transaction(self.conn, |tx| {
            let mut stmt = tx.prepare(&format!("{LIST_SELECT_SQL} {order_sql};"))?;
            let mut rows = stmt.query([])?;
            let mut lists = Vec::new();
            while let Some(row) = rows.next()? {
                let uuid_text: String = row.get("list_uuid")?;
                lists.push(TaskList::with_id(
                    parse_uuid(&uuid_text, "task_lists.list_uuid")?,
                    row.get::<_, String>("name")?,
                    row.get("created_at")?,
                ));
            }

            let mut tasks_by_list = load_all_tasks_grouped(tx)?;
            for list in &mut lists {
                list.tasks = tasks_by_list.remove(&list.list_id).unwrap_or_default();
            }
            Ok(lists)
        })
    }

    fn insert_task(&self, task: &Task) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            ensure_list_exists(tx, task.list_id)?;
            let position = next_position(tx, task.list_id)?;
            insert_task_row(tx, task, position)
        })
    }

    fn update_task_content(&self, task_id: TaskId, name: &str, note: &str) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            let changed = tx.execute(
                "UPDATE tasks SET name = ?2, note = ?3 WHERE task_uuid = ?1;",
                params![task_id.to_string(), name, note],
            )?;
            if changed == 0 {
                return Err(RepoError::TaskNotFound(task_id));
            }
            Ok(())
        })
    }

    fn delete_task(&self, task_id: TaskId) -> RepoResult<()> {
        run_in_transaction(self.conn, |tx| {
            let changed =
                tx.execute("DELETE FROM tasks WHERE task_uuid = ?1;", [task_id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::TaskNotFound(task_id));
            }
            Ok(())
        })
    }

    fn toggle_task_completion(&self, task_id: TaskId, changed_at: i64) -> RepoResult<Task> {
        run_in_transaction(self.conn, |tx| {
            let changed = tx.execute(
                "UPDATE tasks
                 SET is_complete = 1 - is_complete,
                     status_changed_at = ?2
                 WHERE task_uuid = ?1;",
                params![task_id.to_string(), changed_at],
            )?;
            if changed == 0 {
                return Err(RepoError::TaskNotFound(task_id));
            }
            load_required_task(tx, task_id)
        })
    }

    fn set_task_completion(
        &self,
        task_id: TaskId,
        is_complete: bool,
        changed_at: i64,
    ) -> RepoResult<Task> {
        run_in_transaction(self.conn, |tx| {
            let changed = tx.execute(
                "UPDATE tasks
                 SET is_complete = ?2,
                     status_changed_at = ?3
                 WHERE task_uuid = ?1;",
                params![task_id.to_string(), bool_to_int(is_complete), changed_at],
            )?;
            if changed == 0 {
                return Err(RepoError::TaskNotFound(task_id));
            }
            load_required_task(tx, task_id)
        })
    }

    fn get_task(&self, task_id: TaskId) -> RepoResult<Option<Task>> {
        load_task(self.conn, task_id)
    }

    fn list_tasks(&self, list_id: TaskListId, query: &TaskQuery) -> RepoResult<Vec<Task>> {
        run_read_transaction(self.conn, |tx| query_tasks(tx, list_id, query))
    }

    fn task_sections(&self, list_id: TaskListId) -> RepoResult<TaskSections> {
        run_read_transaction(self.conn, |tx| {
            let current = query_tasks(
                tx,
                list_id,
                &TaskQuery {
                    filter: CompletionFilter::Current,
                    order: TaskOrder::CreatedAsc,
                },
            )?;
            let completed = query_tasks(
                tx,
                list_id,
                &TaskQuery {
                    filter: CompletionFilter::Completed,
                    order: TaskOrder::CompletedDesc,
                },
            )?;
            Ok(TaskSections { current, completed })
        })
    }
}

/// Existence check plus filtered select; callers supply the snapshot.
fn query_tasks(
    conn: &Connection,
    list_id: TaskListId,
    query: &TaskQuery,
) -> RepoResult<Vec<Task>> {
    ensure_list_exists(conn, list_id)?;

    let filter_sql = match query.filter {
        CompletionFilter::All => "",
        CompletionFilter::Current => " AND is_complete = 0",
        CompletionFilter::Completed => " AND is_complete = 1",
    };
    let order_sql = match query.order {
        TaskOrder::Insertion => "ORDER BY position ASC",
        TaskOrder::CreatedAsc => "ORDER BY created_at ASC, position ASC",
        TaskOrder::CompletedDesc => {
            "ORDER BY COALESCE(status_changed_at, created_at) DESC, position DESC"
        }
    };

    let mut stmt = conn.prepare(&format!(
        "{TASK_SELECT_SQL} WHERE list_uuid = ?1{filter_sql} {order_sql};"
    ))?;
    let mut rows = stmt.query([list_id.to_string()])?;
    let mut tasks = Vec::new();
    while let Some(row) = rows.next()? {
        tasks.push(parse_task_row(row)?);
    }
    Ok(tasks)
}

fn insert_task_row(conn: &Connection, task: &Task, position: i64) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO tasks (
            task_uuid,
            list_uuid,
            name,
            note,
            is_complete,
            position,
            created_at,
            status_changed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
        params![
            task.task_id.to_string(),
            task.list_id.to_string(),
            task.name.as_str(),
            task.note.as_str(),
            bool_to_int(task.is_complete),
            position,
            task.created_at,
            task.status_changed_at,
        ],
    )?;
    Ok(())
}

fn ensure_list_exists(conn: &Connection, list_id: TaskListId) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM task_lists WHERE list_uuid = ?1);",
        [list_id.to_string()],
        |row| row.get(0),
    )?;
    if exists == 1 {
        Ok(())
    } else {
        Err(RepoError::ListNotFound(list_id))
    }
}

fn next_position(conn: &Connection, list_id: TaskListId) -> RepoResult<i64> {
    let position: i64 = conn.query_row(
        "SELECT COALESCE(MAX(position) + 1, 0) FROM tasks WHERE list_uuid = ?1;",
        [list_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(position)
}

fn load_task(conn: &Connection, task_id: TaskId) -> RepoResult<Option<Task>> {
    let mut stmt = conn.prepare(&format!("{TASK_SELECT_SQL} WHERE task_uuid = ?1;"))?;
    let mut rows = stmt.query([task_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_task_row(row)?));
    }
    Ok(None)
}

fn load_required_task(conn: &Connection, task_id: TaskId) -> RepoResult<Task> {
    load_task(conn, task_id)?.ok_or(RepoError::TaskNotFound(task_id))
}

fn load_all_tasks_grouped(conn: &Connection) -> RepoResult<HashMap<TaskListId, Vec<Task>>> {
    let mut stmt = conn.prepare(&format!(
        "{TASK_SELECT_SQL} ORDER BY list_uuid ASC, position ASC;"
    ))?;
    let mut rows = stmt.query([])?;
    let mut grouped: HashMap<TaskListId, Vec<Task>> = HashMap::new();
    while let Some(row) = rows.next()? {
        let task = parse_task_row(row)?;
        grouped.entry(task.list_id).or_default().push(task);
    }
    Ok(grouped)
}

fn parse_task_row(row: &Row<'_>) -> RepoResult<Task> {
    let task_uuid_text: String = row.get("task_uuid")?;
    let list_uuid_text: String = row.get("list_uuid")?;

    let is_complete = match row.get::<_, i64>("is_complete")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid is_complete value `{other}` in tasks.is_complete"
            )));
        }
    };

    Ok(Task {
        task_id: parse_uuid(&task_uuid_text, "tasks.task_uuid")?,
        list_id: parse_uuid(&list_uuid_text, "tasks.list_uuid")?,
        name: row.get("name")?,
        note: row.get("note")?,
        is_complete,
        created_at: row.get("created_at")?,
        status_changed_at: row.get("status_changed_at")?,
    })
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

fn ensure_task_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let required: [(&'static str, &[&'static str]); 2] = [
        ("task_lists", &["list_uuid", "name", "created_at"]),
        (
            "tasks",
            &[
                "task_uuid",
                "list_uuid",
                "name",
                "note",
                "is_complete",
                "position",
                "created_at",
                "status_changed_at",
            ],
        ),
    ];

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
