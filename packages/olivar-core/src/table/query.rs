//! Read-only queries over a table.

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::record::Record;
use crate::value::{parse_number, Value};

use super::table::{RecordRef, Table};

impl Table {
    /// Returns a copy of the referenced record.
    ///
    /// # Returns
    /// `Result<Record, StoreError>` containing the record, or `NotFound`.
    pub fn find(&self, reference: &RecordRef) -> Result<Record> {
        let index = self.position_of(reference)?;
        Ok(self.records[index].clone())
    }

    /// Returns copies of the records accepted by `predicate`, in order.
    pub fn filter<P>(&self, predicate: P) -> Vec<Record>
    where
        P: Fn(&Record) -> bool,
    {
        self.records
            .iter()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Sums a column over every record.
    ///
    /// Values that are not numbers contribute zero, so a stray note typed
    /// into an amount cell does not break the total.
    ///
    /// # Arguments
    /// * `column` - Name of the column to total
    ///
    /// # Returns
    /// `Result<f64, StoreError>` containing the total, or `FieldNotFound` if the
    /// table has no such column.
    pub fn sum(&self, column: &str) -> Result<f64> {
        self.sum_where(column, |_| true)
    }

    /// Sums a column over the records accepted by `predicate`.
    ///
    /// # Arguments
    /// * `column` - Name of the column to total
    /// * `predicate` - Filter applied before summing
    ///
    /// # Returns
    /// `Result<f64, StoreError>` containing the total, or `FieldNotFound`.
    pub fn sum_where<P>(&self, column: &str, predicate: P) -> Result<f64>
    where
        P: Fn(&Record) -> bool,
    {
        let column = self
            .schema
            .get_column(column.trim())
            .ok_or_else(|| StoreError::FieldNotFound {
                table: self.schema.name.clone(),
                field: column.to_string(),
            })?;

        let mut total = 0.0;
        let mut skipped = 0usize;
        for record in self.records.iter().filter(|record| predicate(record)) {
            let Some(value) = record.get(&column.name) else {
                continue;
            };
            if let Value::Text(text) = value {
                if parse_number(text).is_none() {
                    skipped += 1;
                }
            }
            total += value.to_number_lossy();
        }

        if skipped > 0 {
            debug!(
                "Sum of '{}' in table '{}' skipped {} non-numeric values",
                column.name,
                self.schema.name,
                skipped
            );
        }
        Ok(total)
    }
}
