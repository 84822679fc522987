//! Data types exchanged with the remote medication service.
//!
//! Field names are kept exactly as the service sends and expects them.
//! Response types are decoded leniently: missing or `null` fields fall back
//! to defaults so one odd record never empties a whole list.

pub mod enums;
pub mod extraction;
pub mod medication;
pub mod profile;
pub mod safety;

pub use enums::*;
pub use extraction::*;
pub use medication::*;
pub use profile::*;
pub use safety::*;

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Invalid {field} value: {value}")]
    InvalidEnum { field: String, value: String },
}

/// Serde helpers shared by the response types.
pub(crate) mod lenient {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    /// `null` and missing both decode to an empty string.
    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// `null` decodes to `false`.
    pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
    }

    /// `null` decodes to an empty list.
    pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }

    /// Accepts `YYYY-MM-DD` or any timestamp starting with it.
    /// Anything else, including non-string values, decodes to `None`.
    pub fn date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(raw.as_str().and_then(|s| {
            let head = s.get(..10).unwrap_or(s);
            NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
        }))
    }

    /// Whole years from a number or numeric string. Fractions are truncated;
    /// `null`, negatives and anything unparseable give 0.
    pub fn age<'de, D>(deserializer: D) -> Result<u32, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let years = match &raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(years
            .filter(|y| y.is_finite() && *y >= 0.0)
            .map(|y| y.min(u32::MAX as f64) as u32)
            .unwrap_or(0))
    }

    /// A number or numeric string; `null` and anything else give 0.0.
    pub fn number<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        let value = match &raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        Ok(value.unwrap_or(0.0))
    }
}
