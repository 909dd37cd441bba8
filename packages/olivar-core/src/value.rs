//! Cell values stored in records.
//!
//! A [`Value`] is what one spreadsheet cell holds once it has been read into a
//! record: nothing, a piece of text, a number or a calendar date. Parsing
//! helpers here accept the formats farm users actually type (`12,50`,
//! `01/03/2024`) next to the canonical ones.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

/// Canonical date format used for display and text round-trips.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Additional day-first format accepted on input.
const DAY_FIRST_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Blank cell
    #[default]
    Empty,
    /// Free text, also used for legacy cells that do not fit their column type
    Text(String),
    /// Numeric cell
    Number(f64),
    /// Calendar date without time of day
    Date(NaiveDate),
}

impl Value {
    /// Returns true for a blank cell.
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Returns the text content, if this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the number, if this is a numeric value.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(number) => Some(*number),
            _ => None,
        }
    }

    /// Returns the date, if this is a date value.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(date) => Some(*date),
            _ => None,
        }
    }

    /// Coerces the value to a number, treating anything unparsable as zero.
    ///
    /// This is the tolerant conversion used by totals: legacy sheets contain
    /// stray text in amount columns and a single bad cell must not break a sum.
    pub fn to_number_lossy(&self) -> f64 {
        match self {
            Value::Number(number) => *number,
            Value::Text(text) => parse_number(text).unwrap_or(0.0),
            Value::Empty | Value::Date(_) => 0.0,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(text) => f.write_str(text),
            Value::Number(number) => f.write_str(&format_number(*number)),
            Value::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::from(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        if text.trim().is_empty() {
            Value::Empty
        } else {
            Value::Text(text)
        }
    }
}

impl From<f64> for Value {
    fn from(number: f64) -> Self {
        Value::Number(number)
    }
}

impl From<i64> for Value {
    fn from(number: i64) -> Self {
        Value::Number(number as f64)
    }
}

impl From<u64> for Value {
    fn from(number: u64) -> Self {
        Value::Number(number as f64)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Value::Date(date)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Empty, Into::into)
    }
}

/// Parses a user-entered number.
///
/// Accepts `.` as decimal separator, or a single `,` when no `.` is present.
/// Rejects non-finite results such as `inf` or `NaN`.
pub fn parse_number(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    let normalized = if !trimmed.contains('.') && trimmed.matches(',').count() == 1 {
        trimmed.replace(',', ".")
    } else {
        trimmed.to_string()
    };

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Parses a user-entered date in `YYYY-MM-DD` or `DD/MM/YYYY` form.
///
/// A trailing time of day (`2024-03-01 00:00:00`) is ignored.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DAY_FIRST_DATE_FORMAT) {
        return Some(date);
    }
    let (day_part, _time) = trimmed.split_once([' ', 'T'])?;
    NaiveDate::parse_from_str(day_part, DATE_FORMAT).ok()
}

/// Formats a number without a trailing `.0` for whole values.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{}", number)
    }
}
