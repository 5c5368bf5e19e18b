//! Budgets module - domain models and traits.

mod budgets_model;
mod budgets_traits;


pub use budgets_model::{parse_timestamp, Budget, BudgetInput};
pub use budgets_traits::BudgetRepositoryTrait;
