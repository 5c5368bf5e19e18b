//! SQLite unit of work and the factory that opens one per request.

use async_trait::async_trait;
use std::sync::Arc;

use crate::budgets::BudgetRepository;
use crate::db::{get_connection, DbContext, DbPool, WriteHandle};

use trackmybudget_core::budgets::BudgetRepositoryTrait;
use trackmybudget_core::errors::Result;
use trackmybudget_core::{UnitOfWorkFactoryTrait, UnitOfWorkTrait};

/// Owns one [`DbContext`] and the repositories sharing it.
pub struct UnitOfWork {
    context: Arc<DbContext>,
    budgets: BudgetRepository,
}

impl UnitOfWork {
    pub fn new(context: DbContext) -> Self {
        let context = Arc::new(context);
        Self {
            budgets: BudgetRepository::new(Arc::clone(&context)),
            context,
        }
    }
}

#[async_trait]
impl UnitOfWorkTrait for UnitOfWork {
    fn budgets(&self) -> &dyn BudgetRepositoryTrait {
        &self.budgets
    }

    async fn commit(&self) -> Result<usize> {
        self.context.save_changes().await
    }
}

/// Hands out a fresh [`UnitOfWork`] per call, each on its own pooled
/// connection, all writing through the shared writer actor.
#[derive(Clone)]
pub struct SqliteUnitOfWorkFactory {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SqliteUnitOfWorkFactory {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

impl UnitOfWorkFactoryTrait for SqliteUnitOfWorkFactory {
    fn begin(&self) -> Result<Box<dyn UnitOfWorkTrait>> {
        let conn = get_connection(&self.pool)?;
        let context = DbContext::new(conn, self.writer.clone());
        Ok(Box::new(UnitOfWork::new(context)))
    }
}
