//! Session cache: the live workbook of one session, written through to disk.
//!
//! A session loads the workbook once and serves every read from memory. Each
//! mutation is applied to the cached table and the whole workbook is saved
//! before the call returns. If the save fails, the table is restored to its
//! state before the call, so memory and disk agree after every completed call.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, error};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::persistence::PersistenceManager;
use crate::record::Record;
use crate::schema::SchemaRegistry;
use crate::table::{RecordId, RecordRef, Table};
use crate::value::Value;
use crate::workbook::Workbook;

/// Live workbook plus the persistence it writes through to.
#[derive(Debug)]
pub struct Session {
    workbook: Workbook,
    persistence: PersistenceManager,
}

impl Session {
    /// Opens a session: loads (and migrates) the workbook at `config.workbook_path`.
    ///
    /// # Arguments
    /// * `config` - Store configuration
    /// * `registry` - Table schemas
    ///
    /// # Returns
    /// `Result<Session, StoreError>` containing the session, or the load failure.
    pub fn open(config: &StoreConfig, registry: Arc<SchemaRegistry>) -> Result<Self> {
        Self::with_persistence(PersistenceManager::new(config, registry))
    }

    /// Opens a session over an existing persistence manager.
    pub fn with_persistence(persistence: PersistenceManager) -> Result<Self> {
        let workbook = persistence.load()?;
        Ok(Self {
            workbook,
            persistence,
        })
    }

    /// The cached workbook.
    pub fn workbook(&self) -> &Workbook {
        &self.workbook
    }

    /// Path of the backing workbook file.
    pub fn path(&self) -> &Path {
        self.persistence.path()
    }

    /// Snapshot of every record of `table`.
    pub fn list(&self, table: &str) -> Result<Vec<Record>> {
        Ok(self.workbook.table(table)?.list())
    }

    /// Copy of one record.
    pub fn find(&self, table: &str, reference: &RecordRef) -> Result<Record> {
        self.workbook.table(table)?.find(reference)
    }

    /// Creates a record and saves the workbook.
    ///
    /// # Returns
    /// `Result<Record, StoreError>` containing the stored record with its
    /// identifier.
    pub fn create(&mut self, table: &str, fields: &[(&str, Value)]) -> Result<Record> {
        self.write_through(table, |t| t.create(fields))
    }

    /// Updates the listed fields of one record and saves the workbook.
    pub fn update(
        &mut self,
        table: &str,
        reference: &RecordRef,
        fields: &[(&str, Value)],
    ) -> Result<Record> {
        self.write_through(table, |t| t.update(reference, fields))
    }

    /// Deletes one record and saves the workbook.
    ///
    /// Confirmation is the caller's concern; the record is removed immediately.
    pub fn delete(&mut self, table: &str, reference: &RecordRef) -> Result<Record> {
        self.write_through(table, |t| t.delete(reference))
    }

    /// Sums a column, counting non-numeric values as zero.
    pub fn sum(&self, table: &str, column: &str) -> Result<f64> {
        self.workbook.table(table)?.sum(column)
    }

    /// Sums a column over the records accepted by `predicate`.
    pub fn sum_where<P>(&self, table: &str, column: &str, predicate: P) -> Result<f64>
    where
        P: Fn(&Record) -> bool,
    {
        self.workbook.table(table)?.sum_where(column, predicate)
    }

    /// Identifier the next `create` on `table` will assign.
    ///
    /// # Returns
    /// `Ok(None)` for tables without an identifier column.
    pub fn next_id(&self, table: &str) -> Result<Option<RecordId>> {
        self.workbook.table(table)?.next_id()
    }

    /// Saves the cached workbook, e.g. to persist migrations applied on load.
    pub fn save(&self) -> Result<()> {
        self.persistence.save(&self.workbook)
    }

    /// Discards the cache and loads the workbook from disk again.
    pub fn reload(&mut self) -> Result<()> {
        self.workbook = self.persistence.load()?;
        Ok(())
    }

    /// Applies `operation` to `table`, then saves; rolls the table back if the save fails.
    fn write_through<T, F>(&mut self, table: &str, operation: F) -> Result<T>
    where
        F: FnOnce(&mut Table) -> Result<T>,
    {
        let snapshot = self.workbook.table(table)?.clone();
        let output = operation(self.workbook.table_mut(table)?)?;

        if let Err(err) = self.persistence.save(&self.workbook) {
            error!(
                "Save failed after change to table '{}', rolling back: {}",
                table, err
            );
            *self.workbook.table_mut(table)? = snapshot;
            return Err(err);
        }

        debug!("Change to table '{}' written through", table);
        Ok(output)
    }
}
