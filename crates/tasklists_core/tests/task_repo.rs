use rusqlite::Connection;
use tasklists_core::db::migrations::latest_version;
use tasklists_core::db::open_db_in_memory;
use tasklists_core::{
    RepoError, SqliteTaskRepository, Task, TaskList, TaskQuery, TaskRepository,
};
use uuid::Uuid;

fn list_with_tasks(name: &str, task_names: &[&str]) -> TaskList {
    let mut list = TaskList::new(name, 100);
    list.tasks = task_names
        .iter()
        .map(|task_name| Task::new(list.list_id, *task_name, "", 100))
        .collect();
    list
}

#[test]
fn insert_lists_and_get_list_preserve_task_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let list = list_with_tasks("Order", &["one", "two", "three"]);
    repo.insert_lists(std::slice::from_ref(&list)).unwrap();

    let loaded = repo.get_list(list.list_id).unwrap().unwrap();
    assert_eq!(loaded, list);
    assert!(repo.get_list(Uuid::new_v4()).unwrap().is_none());
}

#[test]
fn insert_lists_is_all_or_nothing() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let first = list_with_tasks("First", &["a"]);
    let mut second = list_with_tasks("Second", &["b"]);
    // Reusing a task id violates the primary key on the last insert.
    second.tasks[0].task_id = first.tasks[0].task_id;

    let err = repo.insert_lists(&[first.clone(), second]).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert!(repo.get_list(first.list_id).unwrap().is_none());
}

#[test]
fn insert_task_continues_positions_after_import() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let list = list_with_tasks("Mixed", &["imported"]);
    repo.insert_lists(std::slice::from_ref(&list)).unwrap();
    let appended = Task::new(list.list_id, "appended", "", 50);
    repo.insert_task(&appended).unwrap();

    let tasks = repo.list_tasks(list.list_id, &TaskQuery::default()).unwrap();
    let names: Vec<_> = tasks.iter().map(|task| task.name.as_str()).collect();
    assert_eq!(names, vec!["imported", "appended"]);
}

#[test]
fn insert_task_for_missing_list_returns_list_not_found() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();

    let orphan = Task::new(Uuid::new_v4(), "orphan", "", 0);
    let err = repo.insert_task(&orphan).unwrap_err();
    assert!(matches!(err, RepoError::ListNotFound(id) if id == orphan.list_id));
}

#[test]
fn schema_cascade_removes_tasks_when_list_row_is_deleted() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let list = list_with_tasks("Cascade", &["x", "y"]);
    repo.insert_lists(std::slice::from_ref(&list)).unwrap();

    conn.execute(
        "DELETE FROM task_lists WHERE list_uuid = ?1;",
        [list.list_id.to_string()],
    )
    .unwrap();

    let remaining: i64 = conn
        .query_row("SELECT COUNT(*) FROM tasks;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(remaining, 0);
}

#[test]
fn read_rejects_invalid_persisted_uuid() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteTaskRepository::try_new(&conn).unwrap();
    let list = list_with_tasks("Corrupt", &[]);
    repo.insert_lists(std::slice::from_ref(&list)).unwrap();

    conn.execute(
        "INSERT INTO tasks (task_uuid, list_uuid, name, note, is_complete, position, created_at)
         VALUES ('not-a-uuid', ?1, 'bad', '', 0, 0, 0);",
        [list.list_id.to_string()],
    )
    .unwrap();

    let err = repo.get_list(list.list_id).unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("tasks.task_uuid")));
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteTaskRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_without_required_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("task_lists"))
    ));
}

#[test]
fn repository_rejects_connection_missing_required_column() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE task_lists (
            list_uuid TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            created_at INTEGER NOT NULL
        );
        CREATE TABLE tasks (
            task_uuid TEXT PRIMARY KEY NOT NULL,
            list_uuid TEXT NOT NULL,
            name TEXT NOT NULL,
            note TEXT NOT NULL,
            is_complete INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );",
    )
    .unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteTaskRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "tasks",
            column: "position"
        })
    ));
}
