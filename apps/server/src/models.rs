use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use trackmybudget_core::budgets as core_budgets;

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub id: Uuid,
    pub category: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl From<core_budgets::Budget> for Budget {
    fn from(b: core_budgets::Budget) -> Self {
        Self {
            id: b.id,
            category: b.category,
            amount: b.amount,
            start_date: b.start_date,
            end_date: b.end_date,
        }
    }
}

/// Body of create and update requests. An `id` sent by the client is ignored.
#[derive(Deserialize, ToSchema, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "input_format::deserialize_decimal")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    #[serde(default, deserialize_with = "input_format::deserialize_timestamp")]
    pub start_date: DateTime<Utc>,
    #[serde(default, deserialize_with = "input_format::deserialize_timestamp")]
    pub end_date: DateTime<Utc>,
}

impl From<BudgetRequest> for core_budgets::BudgetInput {
    fn from(r: BudgetRequest) -> Self {
        Self {
            category: r.category,
            amount: r.amount,
            start_date: r.start_date,
            end_date: r.end_date,
        }
    }
}

mod input_format {
    use chrono::{DateTime, Utc};
    use rust_decimal::Decimal;
    use serde::{self, Deserialize, Deserializer};
    use serde_json::Value;
    use std::str::FromStr;

    fn parse_decimal_value(value: &str) -> Result<Decimal, String> {
        let trimmed = value.trim();
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_err(|e| format!("Invalid decimal value '{}': {}", value, e))
    }

    /// Accepts a JSON number or a numeric string. Numbers keep their literal
    /// digits.
    pub fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => parse_decimal_value(&s).map_err(serde::de::Error::custom),
            Value::Number(n) => {
                parse_decimal_value(&n.to_string()).map_err(serde::de::Error::custom)
            }
            other => Err(serde::de::Error::custom(format!(
                "Expected a number or numeric string, got {}",
                other
            ))),
        }
    }

    pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        trackmybudget_core::budgets::parse_timestamp(&raw)
            .map_err(|e| serde::de::Error::custom(format!("Invalid timestamp '{}': {}", raw, e)))
    }
}
