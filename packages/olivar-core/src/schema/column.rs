//! Column definitions and value conversion per semantic type.

use std::fmt;

use crate::value::{format_number, parse_date, parse_number, Value};

/// Semantic type of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// Free text
    Text,
    /// Numeric amount or quantity
    Number,
    /// Calendar date
    Date,
    /// One of a fixed set of options (stored as text)
    Choice(Vec<String>),
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Text => write!(f, "text"),
            ColumnType::Number => write!(f, "number"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Choice(options) => write!(f, "choice of [{}]", options.join(", ")),
        }
    }
}

/// Column definition within a table schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name, also the sheet header
    pub name: String,
    /// Semantic type
    pub column_type: ColumnType,
}

impl Column {
    /// Creates a column with the given name and type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    /// Free-text column.
    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Text)
    }

    /// Numeric column.
    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Number)
    }

    /// Date column.
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }

    /// Enumerated-choice column.
    pub fn choice<I, S>(name: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            ColumnType::Choice(options.into_iter().map(Into::into).collect()),
        )
    }

    /// Converts a caller-supplied value to this column's type.
    ///
    /// # Arguments
    /// * `value` - Value as entered by the caller
    ///
    /// # Returns
    /// The converted value, or a human-readable reason when the value does
    /// not fit the column.
    pub fn coerce(&self, value: Value) -> Result<Value, String> {
        if value.is_empty() {
            return Ok(Value::Empty);
        }

        match (&self.column_type, value) {
            (ColumnType::Text, Value::Text(text)) => Ok(Value::Text(text)),
            (ColumnType::Text, other) => Ok(Value::Text(other.to_string())),

            (ColumnType::Number, Value::Number(number)) if number.is_finite() => {
                Ok(Value::Number(number))
            }
            (ColumnType::Number, Value::Text(text)) => parse_number(&text)
                .map(Value::Number)
                .ok_or_else(|| format!("'{}' is not a number", text)),
            (ColumnType::Number, other) => Err(format!("'{}' is not a number", other)),

            (ColumnType::Date, Value::Date(date)) => Ok(Value::Date(date)),
            (ColumnType::Date, Value::Text(text)) => parse_date(&text)
                .map(Value::Date)
                .ok_or_else(|| format!("'{}' is not a date (expected YYYY-MM-DD)", text)),
            (ColumnType::Date, other) => Err(format!("'{}' is not a date", other)),

            (ColumnType::Choice(options), other) => {
                let text = other.to_string();
                options
                    .iter()
                    .find(|option| option.eq_ignore_ascii_case(text.trim()))
                    .map(|option| Value::Text(option.clone()))
                    .ok_or_else(|| {
                        format!("'{}' is not one of [{}]", text, options.join(", "))
                    })
            }
        }
    }

    /// Converts a value read from disk, keeping anything that does not fit as text.
    ///
    /// Never fails: legacy sheets may hold malformed cells and loading must not
    /// lose them.
    pub fn coerce_lenient(&self, value: Value) -> Value {
        match (&self.column_type, value) {
            (_, Value::Empty) => Value::Empty,
            (ColumnType::Text | ColumnType::Choice(_), Value::Number(number)) => {
                Value::Text(format_number(number))
            }
            (ColumnType::Text | ColumnType::Choice(_), Value::Date(date)) => {
                Value::Text(Value::Date(date).to_string())
            }
            (ColumnType::Choice(options), Value::Text(text)) => Value::Text(
                options
                    .iter()
                    .find(|option| option.eq_ignore_ascii_case(text.trim()))
                    .cloned()
                    .unwrap_or(text),
            ),
            (ColumnType::Number, Value::Text(text)) => {
                parse_number(&text).map_or(Value::Text(text), Value::Number)
            }
            (ColumnType::Date, Value::Text(text)) => {
                parse_date(&text).map_or(Value::Text(text), Value::Date)
            }
            (_, other) => other,
        }
    }
}
