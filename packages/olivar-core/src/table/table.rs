//! Table storage and record CRUD.
//!
//! Each table has:
//! - The current schema it conforms to
//! - Records in insertion order
//! - Optional identifier column driving identity-based addressing

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::schema::TableSchema;
use crate::value::Value;

use super::identifier::{next_after, record_ids, RecordId};

/// Address of a record within a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordRef {
    /// Stable identity, for tables with an identifier column
    Id(RecordId),
    /// Zero-based position; only meaningful for the snapshot it was taken from
    Position(usize),
}

impl RecordRef {
    /// Reference by identifier.
    pub fn id(id: impl Into<RecordId>) -> Self {
        RecordRef::Id(id.into())
    }

    /// Reference by zero-based position.
    pub fn position(index: usize) -> Self {
        RecordRef::Position(index)
    }
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::Id(id) => write!(f, "with id {}", id),
            RecordRef::Position(index) => write!(f, "at position {}", index),
        }
    }
}

/// Which operation field values are converted for.
enum Operation {
    Create,
    Update(Option<RecordId>),
}

/// A named, schema-conforming sequence of records.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    /// Current schema; every record has exactly its columns
    pub(crate) schema: Arc<TableSchema>,
    /// Records in insertion order
    pub(crate) records: Vec<Record>,
}

impl Table {
    /// Creates an empty table.
    pub fn new(schema: Arc<TableSchema>) -> Self {
        Self {
            schema,
            records: Vec::new(),
        }
    }

    /// Creates a table from records already conforming to `schema`.
    ///
    /// Records whose identifier cell is empty, or repeats an earlier record's
    /// identifier, get a freshly allocated one, so identity-based addressing
    /// works for sheets written before the identifier column existed. A
    /// non-empty cell that does not parse is kept as is: the record stays
    /// reachable by position and its value is not lost.
    ///
    /// # Arguments
    /// * `schema` - Current table schema
    /// * `records` - Migrated records in sheet order
    ///
    /// # Returns
    /// The populated table.
    pub fn from_records(schema: Arc<TableSchema>, mut records: Vec<Record>) -> Self {
        backfill_identifiers(&schema, &mut records);
        Self { schema, records }
    }

    /// Table name.
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    /// Current schema.
    pub fn schema(&self) -> &Arc<TableSchema> {
        &self.schema
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the table holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns a copy of every record in order.
    pub fn list(&self) -> Vec<Record> {
        self.records.clone()
    }

    /// Read-only view of the records.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Appends a new record.
    ///
    /// # Arguments
    /// * `fields` - Column values; unknown columns and the identifier column are ignored
    ///
    /// # Returns
    /// `Result<Record, StoreError>` containing the stored record, including its
    /// assigned identifier, `InvalidField` if a value does not fit its column,
    /// or `IdentifiersExhausted`.
    pub fn create(&mut self, fields: &[(&str, Value)]) -> Result<Record> {
        let converted = self.convert_fields(fields, Operation::Create)?;
        let next_id = self.next_id()?;

        let mut record = Record::empty(&self.schema);
        for (column, value) in converted {
            record.set(&column, value);
        }

        let assigned = self
            .schema
            .identifier_column()
            .zip(next_id)
            .map(|(column, id)| (column.name.clone(), id.to_value(&column.column_type), id));
        if let Some((column, value, id)) = assigned {
            record.set(&column, value);
            debug!("Assigned id {} in table '{}'", id, self.name());
        }

        self.records.push(record.clone());
        debug!(
            "Created record in table '{}' ({} records)",
            self.name(),
            self.records.len()
        );
        Ok(record)
    }

    /// Replaces the listed fields of one record, leaving the others untouched.
    ///
    /// # Arguments
    /// * `reference` - Identifier or position of the record
    /// * `fields` - Column values to replace; unknown columns are ignored
    ///
    /// # Returns
    /// `Result<Record, StoreError>` containing the updated record, `NotFound`
    /// if `reference` does not resolve, or `InvalidField` for a bad value or an
    /// attempt to change the identifier.
    pub fn update(&mut self, reference: &RecordRef, fields: &[(&str, Value)]) -> Result<Record> {
        let index = self.position_of(reference)?;
        let current_id = self.record_ids().swap_remove(index);
        let converted = self.convert_fields(fields, Operation::Update(current_id))?;

        let record = &mut self.records[index];
        for (column, value) in converted {
            record.set(&column, value);
        }
        debug!("Updated record {} in table '{}'", reference, self.schema.name);
        Ok(record.clone())
    }

    /// Removes one record; later records shift down by one position.
    ///
    /// # Arguments
    /// * `reference` - Identifier or position of the record
    ///
    /// # Returns
    /// `Result<Record, StoreError>` containing the removed record, or `NotFound`.
    pub fn delete(&mut self, reference: &RecordRef) -> Result<Record> {
        let index = self.position_of(reference)?;
        let removed = self.records.remove(index);
        debug!(
            "Deleted record {} from table '{}' ({} records left)",
            reference,
            self.name(),
            self.records.len()
        );
        Ok(removed)
    }

    /// Resolves a reference to the current position of the record.
    ///
    /// # Returns
    /// `Result<usize, StoreError>` containing the position, or `NotFound`.
    pub fn position_of(&self, reference: &RecordRef) -> Result<usize> {
        match reference {
            RecordRef::Position(index) if *index < self.records.len() => Ok(*index),
            RecordRef::Position(_) => Err(self.not_found(reference)),
            RecordRef::Id(id) => self
                .record_ids()
                .iter()
                .position(|candidate| candidate.as_ref().is_some_and(|c| c.matches(id)))
                .ok_or_else(|| self.not_found(reference)),
        }
    }

    fn not_found(&self, reference: &RecordRef) -> StoreError {
        StoreError::NotFound {
            table: self.schema.name.clone(),
            reference: reference.to_string(),
        }
    }

    /// Converts caller-supplied fields to column values.
    fn convert_fields(
        &self,
        fields: &[(&str, Value)],
        operation: Operation,
    ) -> Result<Vec<(String, Value)>> {
        let mut converted = Vec::with_capacity(fields.len());

        for (name, value) in fields {
            let name = name.trim();
            let Some(column) = self.schema.get_column(name) else {
                debug!("Ignoring unknown field '{}' for table '{}'", name, self.name());
                continue;
            };

            if self.schema.is_identifier(name) {
                match &operation {
                    Operation::Create => {
                        debug!("Ignoring supplied identifier for table '{}'", self.name());
                        continue;
                    }
                    Operation::Update(current) => {
                        let supplied = RecordId::from_value(value, &column.column_type);
                        let unchanged = match (&supplied, current) {
                            (Some(supplied), Some(current)) => supplied.matches(current),
                            _ => false,
                        };
                        if unchanged {
                            continue;
                        }
                        return Err(StoreError::InvalidField {
                            table: self.schema.name.clone(),
                            column: column.name.clone(),
                            reason: "identifier is assigned by the store and cannot be changed"
                                .to_string(),
                        });
                    }
                }
            }

            let value = column
                .coerce(value.clone())
                .map_err(|reason| StoreError::InvalidField {
                    table: self.schema.name.clone(),
                    column: column.name.clone(),
                    reason,
                })?;
            converted.push((column.name.clone(), value));
        }

        Ok(converted)
    }
}

/// Gives empty or repeated identifier cells a fresh identifier.
fn backfill_identifiers(schema: &TableSchema, records: &mut [Record]) {
    let (Some(spec), Some(column)) = (&schema.identifier, schema.identifier_column()) else {
        return;
    };
    let ids = record_ids(schema, records);

    let mut seen = HashSet::new();
    let mut needs_id = Vec::new();
    for (index, id) in ids.iter().enumerate() {
        match id {
            Some(id) if seen.insert((id.prefix().to_ascii_lowercase(), id.number())) => {}
            Some(_) => needs_id.push(index),
            None => match records[index].get(&column.name) {
                Some(value) if !value.is_empty() => warn!(
                    "Table '{}': row {} has malformed '{}' value '{}', keeping it",
                    schema.name,
                    index + 1,
                    column.name,
                    value
                ),
                _ => needs_id.push(index),
            },
        }
    }

    let mut next = next_after(ids.iter().flatten(), spec.prefix.as_deref(), &column.column_type);
    for index in needs_id {
        let Some(id) = next else {
            warn!(
                "Table '{}': no identifier left for row {}, leaving it unaddressed",
                schema.name,
                index + 1
            );
            continue;
        };
        warn!(
            "Table '{}': row {} has no usable '{}' value, assigning {}",
            schema.name,
            index + 1,
            column.name,
            id
        );
        records[index].set(&column.name, id.to_value(&column.column_type));
        next = id.successor(&column.column_type);
    }
}
