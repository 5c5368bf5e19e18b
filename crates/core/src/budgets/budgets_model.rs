//! Budget domain models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{Result, ValidationError};
use crate::repository::Entity;

/// Domain model representing a budget.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub category: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub amount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl Entity for Budget {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Budget {
    /// Overwrites every mutable field from `input`. The id is left untouched.
    pub fn overwrite_with(&mut self, input: BudgetInput) {
        self.category = input.category;
        self.amount = input.amount;
        self.start_date = input.start_date;
        self.end_date = input.end_date;
    }
}

/// Client-supplied budget fields, used for both create and update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BudgetInput {
    pub category: String,
    pub amount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl BudgetInput {
    /// Rejects a blank category and an inverted date range.
    /// The amount is not range checked.
    pub fn validate(&self) -> Result<()> {
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingField("category".to_string()).into());
        }
        if self.start_date > self.end_date {
            return Err(ValidationError::InvalidInput(format!(
                "startDate {} is after endDate {}",
                self.start_date.to_rfc3339(),
                self.end_date.to_rfc3339()
            ))
            .into());
        }
        Ok(())
    }

    /// Builds a budget under a freshly assigned id.
    pub fn into_budget(self, id: Uuid) -> Budget {
        Budget {
            id,
            category: self.category,
            amount: self.amount,
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }
}

/// Parses a stored or client-supplied timestamp.
///
/// Accepts RFC 3339 (normalised to UTC), a naive `YYYY-MM-DDTHH:MM:SS[.f]`
/// date-time or a bare `YYYY-MM-DD` date; naive values are taken as UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    let trimmed = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    let date = chrono::NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")?;
    Ok(date.and_time(chrono::NaiveTime::MIN).and_utc())
}
