use async_trait::async_trait;

use crate::budgets::BudgetRepositoryTrait;
use crate::errors::Result;

/// One transaction boundary, scoped to a single request.
///
/// All repositories handed out by a unit of work share its staged change set.
/// Dropping the unit of work releases its store connection and discards any
/// change that was not committed.
#[async_trait]
pub trait UnitOfWorkTrait: Send + Sync {
    fn budgets(&self) -> &dyn BudgetRepositoryTrait;

    /// Flushes every staged change atomically and returns the number of
    /// affected records.
    async fn commit(&self) -> Result<usize>;
}

/// Opens units of work. Held by the composition root and called once per
/// request.
pub trait UnitOfWorkFactoryTrait: Send + Sync {
    fn begin(&self) -> Result<Box<dyn UnitOfWorkTrait>>;
}
