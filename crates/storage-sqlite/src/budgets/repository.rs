use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use super::model::BudgetDB;
use crate::db::{DbContext, EntityState};
use crate::errors::IntoCore;
use crate::schema::budgets;

use trackmybudget_core::budgets::{Budget, BudgetRepositoryTrait};
use trackmybudget_core::errors::{DatabaseError, Result};
use trackmybudget_core::RepositoryTrait;

/// Budget repository bound to one unit of work's [`DbContext`].
///
/// Reads hit the context's connection and see the changes staged so far.
/// Writes are only staged; nothing reaches the database before commit.
pub struct BudgetRepository {
    context: Arc<DbContext>,
}

impl BudgetRepository {
    pub fn new(context: Arc<DbContext>) -> Self {
        Self { context }
    }

    fn load_budgets_impl(&self) -> Result<Vec<Budget>> {
        self.context.with_connection(|conn| {
            let rows = budgets::table
                .select(BudgetDB::as_select())
                .load::<BudgetDB>(conn)
                .into_core()?;
            rows.into_iter().map(Budget::try_from).collect()
        })
    }

    fn find_budget_impl(&self, budget_id: Uuid) -> Result<Option<Budget>> {
        self.context.with_connection(|conn| {
            budgets::table
                .find(budget_id.to_string())
                .select(BudgetDB::as_select())
                .first::<BudgetDB>(conn)
                .optional()
                .into_core()?
                .map(Budget::try_from)
                .transpose()
        })
    }
}

#[async_trait]
impl RepositoryTrait<Budget> for BudgetRepository {
    async fn get_all(&self) -> Result<Vec<Budget>> {
        let stored = self.load_budgets_impl()?;
        self.context.budgets().overlay(stored)
    }

    async fn get_by_id(&self, budget_id: Uuid) -> Result<Option<Budget>> {
        match self.context.budgets().find(budget_id)? {
            Some(EntityState::Added(budget)) | Some(EntityState::Modified(budget)) => {
                Ok(Some(budget))
            }
            Some(EntityState::Deleted(_)) => Ok(None),
            None => self.find_budget_impl(budget_id),
        }
    }

    async fn add(&self, budget: Budget) -> Result<()> {
        self.context.budgets().add(budget)
    }

    fn update(&self, budget: Budget) -> Result<()> {
        self.context.budgets().update(budget)
    }

    fn remove(&self, budget: Budget) -> Result<()> {
        self.context.budgets().remove(budget)
    }
}

impl BudgetRepositoryTrait for BudgetRepository {}

/// Writes staged budget changes in staging order and returns the number of
/// affected rows. Runs inside the writer's transaction, so any error here
/// rolls back the whole batch.
pub(crate) fn apply_budget_changes(
    conn: &mut SqliteConnection,
    changes: &[EntityState<Budget>],
) -> Result<usize> {
    let mut affected = 0;

    for change in changes {
        affected += match change {
            EntityState::Added(budget) => diesel::insert_into(budgets::table)
                .values(BudgetDB::from(budget))
                .execute(conn)
                .into_core()?,
            EntityState::Modified(budget) => {
                let row = BudgetDB::from(budget);
                let rows = diesel::update(budgets::table.find(row.id.clone()))
                    .set(&row)
                    .execute(conn)
                    .into_core()?;
                expect_existing(rows, budget.id, "update")?
            }
            EntityState::Deleted(budget) => {
                let rows = diesel::delete(budgets::table.find(budget.id.to_string()))
                    .execute(conn)
                    .into_core()?;
                expect_existing(rows, budget.id, "delete")?
            }
        };
    }

    Ok(affected)
}

// Updates and deletes of rows that are gone fail the batch.
fn expect_existing(rows: usize, budget_id: Uuid, action: &str) -> Result<usize> {
    if rows == 0 {
        return Err(DatabaseError::NotFound(format!(
            "Budget {} no longer exists, cannot {}",
            budget_id, action
        ))
        .into());
    }
    Ok(rows)
}
