use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;

use crate::types::errors::CoercionError;
use crate::types::Timestamp;

const DATETIME_FORMATS: [&str; 5] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S"
];

const OFFSET_DATETIME_FORMATS: [&str; 2] = [
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z"
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// A field value that is either still raw input text or already typed.
///
/// Input providers that read text (CSV, JSON strings) hand over `Raw` values;
/// providers that already hold typed values can skip coercion with `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Coercible<T> {
    Raw(String),
    Value(T)
}

impl<T> Coercible<T> {
    pub fn raw(text: impl Into<String>) -> Self {
        Coercible::Raw(text.into())
    }

    /// Returns the typed value, or `None` while the field is still raw text.
    pub fn value(&self) -> Option<&T> {
        match self {
            Coercible::Value(value) => Some(value),
            Coercible::Raw(_) => None
        }
    }

    /// Raw text that is empty after trimming carries no value at all.
    pub fn is_blank(&self) -> bool {
        matches!(self, Coercible::Raw(text) if text.trim().is_empty())
    }

    pub fn coerce_with<F>(self, parse: F) -> Result<T, CoercionError>
    where
        F: FnOnce(&str) -> Result<T, CoercionError>,
    {
        match self {
            Coercible::Value(value) => Ok(value),
            Coercible::Raw(text) => parse(&text)
        }
    }
}

impl From<Decimal> for Coercible<Decimal> {
    fn from(value: Decimal) -> Self {
        Coercible::Value(value)
    }
}

impl From<Timestamp> for Coercible<Timestamp> {
    fn from(value: Timestamp) -> Self {
        Coercible::Value(value)
    }
}

/// Parses an amount in plain decimal or scientific notation.
pub fn parse_amount(text: &str) -> Result<Decimal, CoercionError> {
    let value = text.trim();

    if value.is_empty() {
        return Err(CoercionError::InvalidAmount(text.to_string()));
    }

    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|_| CoercionError::InvalidAmount(text.to_string()))
}

/// Parses a timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<Timestamp, CoercionError> {
    let value = text.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(timestamp) = DateTime::parse_from_str(value, format) {
            return Ok(timestamp.with_timezone(&Utc));
        }
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(naive) = date.and_hms_opt(0, 0, 0) {
                return Ok(naive.and_utc());
            }
        }
    }

    Err(CoercionError::InvalidTimestamp(text.to_string()))
}
