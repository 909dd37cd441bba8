//! Record identifiers and allocation of the next one.
//!
//! The next identifier is derived from the records themselves, never from a
//! stored counter: the maximum well-formed identifier plus one, keeping the
//! text prefix of prefixed identifiers. Malformed cells are skipped so that a
//! partially corrupt legacy sheet still allocates.
//!
//! Numeric cells are `f64`, so identifiers stored in number columns stop at
//! [`MAX_CELL_INTEGER`]; past that allocation fails instead of repeating an id.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::schema::{ColumnType, TableSchema};
use crate::value::Value;

use super::Table;

/// Largest integer a numeric cell holds exactly (2^53 - 1).
pub const MAX_CELL_INTEGER: u64 = (1 << 53) - 1;

/// Largest identifier number a column of the given type can store.
fn max_number(column_type: &ColumnType) -> u64 {
    match column_type {
        ColumnType::Number => MAX_CELL_INTEGER,
        _ => u64::MAX,
    }
}

/// Identifier of a record within one table, e.g. `7` or `P7`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordId {
    prefix: String,
    number: u64,
}

impl RecordId {
    /// Plain integer identifier.
    pub fn numeric(number: u64) -> Self {
        Self {
            prefix: String::new(),
            number,
        }
    }

    /// Identifier with a text prefix.
    pub fn prefixed(prefix: impl Into<String>, number: u64) -> Self {
        Self {
            prefix: prefix.into(),
            number,
        }
    }

    /// Numeric part.
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Text prefix; empty for plain integers.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parses `"7"` or `"ID7"`: trailing ASCII digits are the number, the rest the prefix.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let digits_start = text
            .char_indices()
            .rev()
            .take_while(|(_, c)| c.is_ascii_digit())
            .last()
            .map(|(index, _)| index)?;
        let (prefix, digits) = text.split_at(digits_start);
        let number = digits.parse::<u64>().ok()?;
        Some(Self::prefixed(prefix, number))
    }

    /// Reads an identifier from a cell of a column with the given type.
    ///
    /// Numeric columns only accept non-negative whole numbers up to
    /// [`MAX_CELL_INTEGER`] (as numbers or digit-only text); text columns
    /// accept any `prefix + digits` form. Number cells beyond
    /// [`MAX_CELL_INTEGER`] are malformed in every column.
    pub fn from_value(value: &Value, column_type: &ColumnType) -> Option<Self> {
        match value {
            Value::Number(number)
                if number.is_finite()
                    && number.fract() == 0.0
                    && *number >= 0.0
                    && *number <= MAX_CELL_INTEGER as f64 =>
            {
                Some(Self::numeric(*number as u64))
            }
            Value::Text(text) => {
                let id = Self::parse(text)?;
                match column_type {
                    ColumnType::Number if !id.prefix.is_empty() => None,
                    _ if id.number > max_number(column_type) => None,
                    _ => Some(id),
                }
            }
            _ => None,
        }
    }

    /// Converts to the cell value stored in a column of the given type.
    pub fn to_value(&self, column_type: &ColumnType) -> Value {
        match column_type {
            ColumnType::Number => Value::Number(self.number as f64),
            _ => Value::Text(self.to_string()),
        }
    }

    /// Returns true if `other` names the same record. Prefixes compare case-insensitively.
    pub fn matches(&self, other: &RecordId) -> bool {
        self.number == other.number && self.prefix.eq_ignore_ascii_case(&other.prefix)
    }

    /// Next identifier with the same prefix, or `None` if the column cannot store it.
    pub(crate) fn successor(&self, column_type: &ColumnType) -> Option<Self> {
        let number = self
            .number
            .checked_add(1)
            .filter(|number| *number <= max_number(column_type))?;
        Some(Self {
            prefix: self.prefix.clone(),
            number,
        })
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.number)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(text: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(text).ok_or_else(|| format!("'{}' is not a record identifier", text))
    }
}

impl From<u64> for RecordId {
    fn from(number: u64) -> Self {
        Self::numeric(number)
    }
}

/// Computes the identifier following the largest of `ids`.
///
/// The prefix of the largest identifier is re-applied; with no identifiers
/// allocation starts at 1 with the schema's configured prefix. `None` when
/// the largest identifier has no successor the column can store.
pub(crate) fn next_after<'a>(
    ids: impl IntoIterator<Item = &'a RecordId>,
    default_prefix: Option<&str>,
    column_type: &ColumnType,
) -> Option<RecordId> {
    let mut max: Option<&RecordId> = None;
    for id in ids {
        if max.map_or(true, |current| id.number > current.number) {
            max = Some(id);
        }
    }
    match max {
        Some(id) => id.successor(column_type),
        None => Some(RecordId::prefixed(default_prefix.unwrap_or_default(), 1)),
    }
}

impl Table {
    /// Returns the identifier the next `create` will assign.
    ///
    /// Calling this repeatedly without an intervening `create` returns the same
    /// value.
    ///
    /// # Returns
    /// `Ok(None)` for tables without an identifier column, or
    /// `IdentifiersExhausted` once the largest identifier has no successor.
    pub fn next_id(&self) -> Result<Option<RecordId>> {
        let (Some(spec), Some(column)) =
            (self.schema.identifier.as_ref(), self.schema.identifier_column())
        else {
            return Ok(None);
        };
        let ids: Vec<RecordId> = self.record_ids().into_iter().flatten().collect();
        next_after(&ids, spec.prefix.as_deref(), &column.column_type)
            .map(Some)
            .ok_or_else(|| StoreError::IdentifiersExhausted {
                table: self.schema.name.clone(),
                column: column.name.clone(),
            })
    }

    /// Identifier of each record in order; `None` for malformed or missing cells.
    pub(crate) fn record_ids(&self) -> Vec<Option<RecordId>> {
        record_ids(&self.schema, &self.records)
    }
}

pub(crate) fn record_ids(schema: &TableSchema, records: &[Record]) -> Vec<Option<RecordId>> {
    let Some(column) = schema.identifier_column() else {
        return vec![None; records.len()];
    };
    records
        .iter()
        .map(|record| {
            record
                .get(&column.name)
                .and_then(|value| RecordId::from_value(value, &column.column_type))
        })
        .collect()
}
