//! Workbook load and atomic save, with migration applied on load.


pub mod io_utils;
pub mod xlsx;

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::error::Result;
use crate::schema::{migrate_rows, SchemaRegistry, TableSchema};
use crate::table::Table;
use crate::workbook::Workbook;

use io_utils::{retry_io_operation, write_atomic};
use xlsx::RawSheet;

/// Manages reading and writing the workbook file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    /// Store configuration (path, retries, sync)
    config: StoreConfig,
    /// Schemas used to migrate loaded sheets
    registry: Arc<SchemaRegistry>,
}

impl PersistenceManager {
    /// Creates a persistence manager with the given configuration.
    pub fn new(config: &StoreConfig, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            config: config.clone(),
            registry,
        }
    }

    /// Path of the workbook file.
    pub fn path(&self) -> &Path {
        &self.config.workbook_path
    }

    /// Schema registry loaded workbooks are built against.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Loads the workbook and migrates every sheet to its current schema.
    ///
    /// A missing file is not an error: every registered table starts empty.
    /// The file itself is never modified; migrations reach disk on the next save.
    ///
    /// # Returns
    /// `Result<Workbook, StoreError>` containing the migrated workbook.
    pub fn load(&self) -> Result<Workbook> {
        let path = self.path();
        if !path.exists() {
            info!(
                "Workbook {:?} not found, starting with {} empty tables",
                path,
                self.registry.len()
            );
            return Ok(Workbook::empty(self.registry.clone()));
        }

        let sheets = retry_io_operation(
            || xlsx::read_sheets(path),
            &self.config,
            "workbook load",
        )?;

        let tables = self
            .select_sheets(sheets)
            .into_iter()
            .map(|(schema, sheet)| {
                let outcome = migrate_rows(&schema, &sheet.header, sheet.rows);
                if outcome.changed_shape() {
                    info!(
                        "Migrated sheet '{}' to table '{}': {} rules applied, dropped {:?}, added {:?}",
                        sheet.name,
                        schema.name,
                        outcome.applied.len(),
                        outcome.dropped,
                        outcome.filled
                    );
                }
                Table::from_records(schema, outcome.records)
            })
            .collect();

        let workbook = Workbook::from_tables(self.registry.clone(), tables);
        info!(
            "Loaded workbook {:?} ({} tables, {} records)",
            path,
            workbook.tables().len(),
            workbook.record_count()
        );
        Ok(workbook)
    }

    /// Picks the sheet each registered table is read from.
    ///
    /// Unknown sheets are skipped. A sheet under the table's current name is
    /// preferred over one under a legacy name.
    fn select_sheets(&self, sheets: Vec<RawSheet>) -> Vec<(Arc<TableSchema>, RawSheet)> {
        let mut selected: Vec<(Arc<TableSchema>, RawSheet)> = Vec::new();

        for sheet in sheets {
            let Some(schema) = self.registry.resolve_sheet(&sheet.name) else {
                warn!("Skipping sheet '{}': no table with that name", sheet.name);
                continue;
            };

            let is_current = sheet.name.trim() == schema.name;
            match selected.iter_mut().find(|(chosen, _)| chosen.name == schema.name) {
                None => selected.push((schema.clone(), sheet)),
                Some((_, chosen)) => {
                    if is_current && chosen.name.trim() != schema.name {
                        warn!(
                            "Table '{}': using sheet '{}', ignoring legacy sheet '{}'",
                            schema.name, sheet.name, chosen.name
                        );
                        *chosen = sheet;
                    } else {
                        warn!(
                            "Table '{}': ignoring sheet '{}', already read from '{}'",
                            schema.name, sheet.name, chosen.name
                        );
                    }
                }
            }
        }

        selected
    }

    /// Writes every table to the workbook file.
    ///
    /// The new contents go to a temporary file next to the target, which is
    /// then renamed over it. The target is never truncated in place, so a
    /// failed save leaves the previous file intact.
    ///
    /// # Arguments
    /// * `workbook` - Workbook to write
    ///
    /// # Returns
    /// `Result<(), StoreError>` indicating success or failure.
    pub fn save(&self, workbook: &Workbook) -> Result<()> {
        let bytes = xlsx::encode_workbook(workbook)?;
        debug!("Encoded workbook: {} bytes", bytes.len());

        retry_io_operation(
            || write_atomic(self.path(), &bytes, self.config.sync_on_save),
            &self.config,
            "workbook save",
        )?;

        info!(
            "Saved workbook {:?} ({} tables, {} records)",
            self.path(),
            workbook.tables().len(),
            workbook.record_count()
        );
        Ok(())
    }
}
