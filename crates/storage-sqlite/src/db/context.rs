use std::sync::Mutex;

use diesel::SqliteConnection;
use trackmybudget_core::budgets::Budget;
use trackmybudget_core::errors::{DatabaseError, Error, Result};

use super::{ChangeTracker, DbConnection, WriteHandle};
use crate::budgets::apply_budget_changes;

/// A checked-out connection plus the changes staged against it.
///
/// Reads go through the owned connection. Staged changes are flushed through
/// the writer actor by [`DbContext::save_changes`]. Dropping the context
/// returns the connection to the pool and discards anything still staged.
pub struct DbContext {
    conn: Mutex<DbConnection>,
    writer: WriteHandle,
    budgets: ChangeTracker<Budget>,
}

impl DbContext {
    pub fn new(conn: DbConnection, writer: WriteHandle) -> Self {
        Self {
            conn: Mutex::new(conn),
            writer,
            budgets: ChangeTracker::new(),
        }
    }

    pub fn budgets(&self) -> &ChangeTracker<Budget> {
        &self.budgets
    }

    /// Runs a read on this context's connection.
    pub fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| {
            Error::Database(DatabaseError::Internal(
                "Context connection poisoned".to_string(),
            ))
        })?;
        f(&mut conn)
    }

    /// Flushes every staged change in a single transaction and returns the
    /// number of affected rows. On failure nothing is written and the changes
    /// stay staged.
    pub async fn save_changes(&self) -> Result<usize> {
        let budgets = self.budgets.begin_commit()?;
        if budgets.is_empty() {
            return Ok(0);
        }
        let staged = budgets.len();

        let written = self
            .writer
            .exec(move |conn| apply_budget_changes(conn, &budgets))
            .await;
        self.budgets.finish_commit(written.is_ok())?;

        let affected = written?;
        log::debug!("Saved {} change(s), {} row(s) affected", staged, affected);
        Ok(affected)
    }
}

impl Drop for DbContext {
    fn drop(&mut self) {
        let pending = self.budgets.pending_count();
        if pending > 0 {
            log::debug!("Discarding {} uncommitted change(s)", pending);
        }
    }
}
