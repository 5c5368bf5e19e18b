//! Database models for budgets.

use chrono::SecondsFormat;
use diesel::prelude::*;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::StorageError;
use trackmybudget_core::budgets::{parse_timestamp, Budget};
use trackmybudget_core::Error;

/// Database model for budgets. Amounts and timestamps are stored as TEXT.
#[derive(
    Queryable,
    Identifiable,
    Insertable,
    AsChangeset,
    Selectable,
    PartialEq,
    Debug,
    Clone,
)]
#[diesel(table_name = crate::schema::budgets)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct BudgetDB {
    pub id: String,
    pub category: String,
    pub amount: String,
    pub start_date: String,
    pub end_date: String,
}

impl From<&Budget> for BudgetDB {
    fn from(domain: &Budget) -> Self {
        Self {
            id: domain.id.to_string(),
            category: domain.category.clone(),
            amount: domain.amount.to_string(),
            start_date: domain.start_date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            end_date: domain.end_date.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        }
    }
}

impl TryFrom<BudgetDB> for Budget {
    type Error = Error;

    fn try_from(db: BudgetDB) -> Result<Self, Self::Error> {
        let decode = |field: &str, detail: String| -> Error {
            StorageError::Decode(format!("budget {} {}: {}", db.id, field, detail)).into()
        };

        Ok(Budget {
            id: Uuid::parse_str(&db.id).map_err(|e| decode("id", e.to_string()))?,
            amount: Decimal::from_str(&db.amount).map_err(|e| decode("amount", e.to_string()))?,
            start_date: parse_timestamp(&db.start_date)
                .map_err(|e| decode("start_date", e.to_string()))?,
            end_date: parse_timestamp(&db.end_date)
                .map_err(|e| decode("end_date", e.to_string()))?,
            category: db.category,
        })
    }
}
