//! Scoped transactions.
//!
//! # Invariants
//! - The closure result decides the outcome: `Ok` commits, `Err` rolls back.
//! - Rollback also happens when the closure unwinds, because an uncommitted
//!   `rusqlite::Transaction` rolls back on drop.
//! - Write transactions are `IMMEDIATE`, so the write lock is taken up front.
//! - Read transactions are `DEFERRED`; every statement inside one sees the
//!   same database snapshot.

use log::warn;
use rusqlite::{Connection, Transaction, TransactionBehavior};

/// Runs `f` inside one immediate transaction on `conn`.
///
/// The connection is borrowed shared, matching repository types that hold
/// `&Connection`. Callers must not nest calls on the same connection.
///
/// # Errors
/// - Returns the closure error unchanged after rolling back.
/// - Returns `E::from(rusqlite::Error)` when begin or commit fails.
pub fn run_in_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_with_behavior(conn, TransactionBehavior::Immediate, f)
}

/// Runs read-only `f` inside one deferred transaction on `conn`.
///
/// Multi-statement reads use this so they cannot observe a write committed
/// by another connection halfway through.
pub fn run_read_transaction<T, E, F>(conn: &Connection, f: F) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    run_with_behavior(conn, TransactionBehavior::Deferred, f)
}

fn run_with_behavior<T, E, F>(
    conn: &Connection,
    behavior: TransactionBehavior,
    f: F,
) -> Result<T, E>
where
    F: FnOnce(&Transaction<'_>) -> Result<T, E>,
    E: From<rusqlite::Error>,
{
    let tx = Transaction::new_unchecked(conn, behavior)?;
    match f(&tx) {
        Ok(value) => {
            tx.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(
                    "event=tx_rollback module=db status=error error={}",
                    rollback_err
                );
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run_in_transaction, run_read_transaction};
    use rusqlite::Connection;
    use std::time::Duration;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE items (value INTEGER NOT NULL);")
            .unwrap();
        conn
    }

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM items;", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn ok_result_commits() {
        let conn = setup();
        let result: Result<(), rusqlite::Error> = run_in_transaction(&conn, |tx| {
            tx.execute("INSERT INTO items (value) VALUES (1);", [])?;
            Ok(())
        });
        result.unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn err_result_rolls_back_earlier_writes() {
        let conn = setup();
        let result: Result<(), rusqlite::Error> = run_in_transaction(&conn, |tx| {
            tx.execute("INSERT INTO items (value) VALUES (1);", [])?;
            tx.execute("INSERT INTO missing_table (value) VALUES (2);", [])?;
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(count(&conn), 0);
    }

    #[test]
    fn connection_is_reusable_after_rollback() {
        let conn = setup();
        let failed: Result<(), rusqlite::Error> = run_in_transaction(&conn, |_| {
            Err(rusqlite::Error::QueryReturnedNoRows)
        });
        assert!(failed.is_err());

        let ok: Result<(), rusqlite::Error> = run_in_transaction(&conn, |tx| {
            tx.execute("INSERT INTO items (value) VALUES (3);", [])?;
            Ok(())
        });
        ok.unwrap();
        assert_eq!(count(&conn), 1);
    }

    #[test]
    fn read_transaction_sees_one_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.sqlite3");
        let reader = Connection::open(&path).unwrap();
        reader
            .execute_batch("CREATE TABLE items (value INTEGER NOT NULL);")
            .unwrap();
        let writer = Connection::open(&path).unwrap();
        writer.busy_timeout(Duration::ZERO).unwrap();

        let result: Result<(i64, i64), rusqlite::Error> = run_read_transaction(&reader, |tx| {
            let before = count(tx);
            let write = writer.execute("INSERT INTO items (value) VALUES (1);", []);
            assert!(write.is_err());
            Ok((before, count(tx)))
        });
        assert_eq!(result.unwrap(), (0, 0));

        writer
            .execute("INSERT INTO items (value) VALUES (1);", [])
            .unwrap();
        assert_eq!(count(&reader), 1);
    }
}
