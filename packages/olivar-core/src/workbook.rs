//! The in-memory workbook: one table per registered schema, in registry order.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{Result, StoreError};
use crate::schema::SchemaRegistry;
use crate::table::Table;

/// Every table of a session, each conforming to its current schema.
#[derive(Debug, Clone)]
pub struct Workbook {
    registry: Arc<SchemaRegistry>,
    tables: Vec<Table>,
}

impl Workbook {
    /// Creates a workbook with every registered table empty.
    pub fn empty(registry: Arc<SchemaRegistry>) -> Self {
        let tables = registry.iter().map(|schema| Table::new(schema.clone())).collect();
        Self { registry, tables }
    }

    /// Assembles a workbook from loaded tables. Registered tables missing
    /// from `tables` are created empty.
    pub(crate) fn from_tables(registry: Arc<SchemaRegistry>, mut tables: Vec<Table>) -> Self {
        let ordered = registry
            .iter()
            .map(|schema| {
                match tables.iter().position(|table| table.name() == schema.name) {
                    Some(index) => tables.swap_remove(index),
                    None => Table::new(schema.clone()),
                }
            })
            .collect();
        Self {
            registry,
            tables: ordered,
        }
    }

    /// Looks up a table by its current name.
    ///
    /// # Returns
    /// `Result<&Table, StoreError>` containing the table, or `UnknownTable`.
    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .iter()
            .find(|table| table.name() == name)
            .ok_or_else(|| StoreError::UnknownTable {
                table: name.to_string(),
            })
    }

    /// Looks up a table by its current name for mutation.
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .iter_mut()
            .find(|table| table.name() == name)
            .ok_or_else(|| StoreError::UnknownTable {
                table: name.to_string(),
            })
    }

    /// Every table in registry order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    /// Table names in registry order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name()).collect()
    }

    /// Schema registry the workbook was built against.
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    /// Total number of records across all tables.
    pub fn record_count(&self) -> usize {
        self.tables.iter().map(Table::len).sum()
    }

    /// Renders every table as plain text.
    ///
    /// Each table becomes a `[Name]` line, a header line, and one line per
    /// record, with cells separated by ` | `. Tables are separated by a blank
    /// line.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for (index, table) in self.tables.iter().enumerate() {
            if index > 0 {
                out.push('\n');
            }
            let _ = writeln!(out, "[{}]", table.name());
            let _ = writeln!(out, "{}", table.schema().column_names().join(" | "));
            for record in table.records() {
                let cells: Vec<String> = record.values().map(ToString::to_string).collect();
                let _ = writeln!(out, "{}", cells.join(" | "));
            }
        }
        out
    }
}

impl PartialEq for Workbook {
    fn eq(&self, other: &Self) -> bool {
        self.tables == other.tables
    }
}
