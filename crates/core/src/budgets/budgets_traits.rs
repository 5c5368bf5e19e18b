use crate::budgets::budgets_model::Budget;
use crate::repository::RepositoryTrait;

/// Repository for budgets.
pub trait BudgetRepositoryTrait: RepositoryTrait<Budget> {}
