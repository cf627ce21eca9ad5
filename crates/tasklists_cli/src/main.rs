//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tasklists_core` linkage end to end: open a database, seed
//!   starter lists when it is empty, and print each list's status.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `tasklists_cli [DB_PATH]` (in-memory when no path is given).

use std::process::ExitCode;
use std::sync::Arc;
use tasklists_core::db::{open_db, open_db_in_memory};
use tasklists_core::{
    classify, DefaultClock, ListOrder, ListStatus, SqliteTaskRepository, TaskDraft,
    TaskListDraft, TaskStore,
};

fn main() -> ExitCode {
    println!("tasklists_core ping={}", tasklists_core::ping());
    println!("tasklists_core version={}", tasklists_core::core_version());

    match run(std::env::args().nth(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(db_path: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let conn = match db_path {
        Some(path) => open_db(path)?,
        None => open_db_in_memory()?,
    };
    let store = TaskStore::new(SqliteTaskRepository::try_new(&conn)?, Arc::new(DefaultClock));

    if store.list_lists(ListOrder::CreatedAt)?.is_empty() {
        store.import_lists(starter_lists())?;
    }

    for list in store.list_lists(ListOrder::Name)? {
        println!("{}\t{}", list.name, status_column(classify(&list)));
    }
    Ok(())
}

fn starter_lists() -> Vec<TaskListDraft> {
    vec![
        TaskListDraft::new("Shopping List")
            .with_task(TaskDraft::new("Milk", "2L"))
            .with_task(TaskDraft::new("Bread", ""))
            .with_task(TaskDraft::new("Apples", "green").completed()),
        TaskListDraft::new("Moving List")
            .with_task(TaskDraft::new("Boxes", "").completed())
            .with_task(TaskDraft::new("Tape", "").completed()),
        TaskListDraft::new("Someday"),
    ]
}

fn status_column(status: ListStatus) -> String {
    match status {
        ListStatus::Empty => "0".to_string(),
        ListStatus::InProgress(count) => count.to_string(),
        ListStatus::AllDone => "done".to_string(),
    }
}
