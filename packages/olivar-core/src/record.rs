//! Records: one row of a table, keyed by column name.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::schema::TableSchema;
use crate::value::Value;

/// One row of a table.
///
/// Fields are kept in the table's column order and always cover exactly the
/// table's current column set. Records handed out by the store are copies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    /// Creates a record with every column of `schema` empty.
    pub(crate) fn empty(schema: &TableSchema) -> Self {
        Self {
            fields: schema
                .columns
                .iter()
                .map(|column| (column.name.clone(), Value::Empty))
                .collect(),
        }
    }

    /// Creates a record from values given in schema column order.
    ///
    /// Missing trailing values are filled with [`Value::Empty`].
    pub(crate) fn from_values(schema: &TableSchema, values: Vec<Value>) -> Self {
        let mut values = values.into_iter();
        Self {
            fields: schema
                .columns
                .iter()
                .map(|column| (column.name.clone(), values.next().unwrap_or_default()))
                .collect(),
        }
    }

    /// Returns the value of `column`, if the column exists.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Replaces the value of an existing column. Returns false if the column is unknown.
    pub(crate) fn set(&mut self, column: &str, value: Value) -> bool {
        match self.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterates over `(column, value)` pairs in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }

    /// Iterates over column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over values in column order.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.iter().map(|(_, value)| value)
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns true if the displayed value of `column` equals `expected`,
    /// ignoring case and surrounding whitespace.
    ///
    /// Used for the "belongs to parcel X" style filters of aggregate queries.
    pub fn matches(&self, column: &str, expected: &str) -> bool {
        self.get(column).is_some_and(|value| {
            value
                .to_string()
                .trim()
                .eq_ignore_ascii_case(expected.trim())
        })
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
