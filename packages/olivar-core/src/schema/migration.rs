//! Declarative column migrations applied when a sheet is loaded.
//!
//! Rules run in declaration order against the header found on disk, so a
//! sheet several releases behind passes through every step in sequence. After
//! the rules, columns are matched to the current schema by name: unknown
//! columns are dropped and missing ones are filled with empty values.

use std::fmt;

use crate::record::Record;
use crate::value::Value;

use super::TableSchema;

/// One migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationRule {
    /// Drop the column if present
    DropColumn(String),
    /// Rename the column if present
    RenameColumn { from: String, to: String },
}

impl MigrationRule {
    /// Rule dropping `column`.
    pub fn drop(column: impl Into<String>) -> Self {
        MigrationRule::DropColumn(column.into())
    }

    /// Rule renaming `from` to `to`.
    pub fn rename(from: impl Into<String>, to: impl Into<String>) -> Self {
        MigrationRule::RenameColumn {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Applies the rule to a header and its rows. Returns true if anything changed.
    ///
    /// When a rename target already exists, the target keeps its own values and
    /// only blank target cells are filled from the source column, which is then
    /// removed.
    fn apply(&self, columns: &mut Vec<String>, rows: &mut [Vec<Value>]) -> bool {
        match self {
            MigrationRule::DropColumn(name) => match position(columns, name) {
                Some(index) => {
                    remove_column(columns, rows, index);
                    true
                }
                None => false,
            },
            MigrationRule::RenameColumn { from, to } => {
                let Some(from_index) = position(columns, from) else {
                    return false;
                };
                match position(columns, to) {
                    None => columns[from_index] = to.clone(),
                    Some(to_index) => {
                        for row in rows.iter_mut() {
                            let source = row.get(from_index).cloned().unwrap_or_default();
                            if let Some(target) = row.get_mut(to_index) {
                                if target.is_empty() {
                                    *target = source;
                                }
                            } else if !source.is_empty() {
                                row.resize(to_index + 1, Value::Empty);
                                row[to_index] = source;
                            }
                        }
                        remove_column(columns, rows, from_index);
                    }
                }
                true
            }
        }
    }
}

impl fmt::Display for MigrationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationRule::DropColumn(name) => write!(f, "drop '{}'", name),
            MigrationRule::RenameColumn { from, to } => write!(f, "rename '{}' -> '{}'", from, to),
        }
    }
}

/// Result of migrating one sheet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MigrationOutcome {
    /// Records conforming to the current schema
    pub records: Vec<Record>,
    /// Rules that changed the on-disk header
    pub applied: Vec<MigrationRule>,
    /// On-disk columns discarded because no rule or current column covers them
    pub dropped: Vec<String>,
    /// Current columns absent on disk, filled with empty values
    pub filled: Vec<String>,
}

impl MigrationOutcome {
    /// Returns true if the on-disk shape differed from the current schema.
    pub fn changed_shape(&self) -> bool {
        !self.applied.is_empty() || !self.dropped.is_empty() || !self.filled.is_empty()
    }
}

/// Migrates rows read under `on_disk_columns` to `schema`.
///
/// # Arguments
/// * `schema` - Current table schema
/// * `on_disk_columns` - Header row as found in the file
/// * `rows` - Data rows, positionally aligned with `on_disk_columns`
///
/// # Returns
/// Migrated records plus a report of what changed.
pub fn migrate_rows(
    schema: &TableSchema,
    on_disk_columns: &[String],
    mut rows: Vec<Vec<Value>>,
) -> MigrationOutcome {
    let mut columns: Vec<String> = on_disk_columns
        .iter()
        .map(|name| name.trim().to_string())
        .collect();

    let mut applied = Vec::new();
    for rule in &schema.migrations {
        if rule.apply(&mut columns, &mut rows) {
            applied.push(rule.clone());
        }
    }

    let dropped: Vec<String> = columns
        .iter()
        .filter(|name| !name.is_empty() && schema.get_column(name).is_none())
        .cloned()
        .collect();

    let mut sources = Vec::with_capacity(schema.columns.len());
    let mut filled = Vec::new();
    for column in &schema.columns {
        let source = position(&columns, &column.name);
        if source.is_none() {
            filled.push(column.name.clone());
        }
        sources.push(source);
    }

    let records = rows
        .into_iter()
        .filter(|row| row.iter().any(|value| !value.is_empty()))
        .map(|row| {
            let values = schema
                .columns
                .iter()
                .zip(&sources)
                .map(|(column, source)| {
                    let raw = source
                        .and_then(|index| row.get(index).cloned())
                        .unwrap_or_default();
                    column.coerce_lenient(raw)
                })
                .collect();
            Record::from_values(schema, values)
        })
        .collect();

    MigrationOutcome {
        records,
        applied,
        dropped,
        filled,
    }
}

/// First column with the given name. Later duplicates are ignored.
fn position(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|column| column == name)
}

fn remove_column(columns: &mut Vec<String>, rows: &mut [Vec<Value>], index: usize) {
    columns.remove(index);
    for row in rows.iter_mut() {
        if index < row.len() {
            row.remove(index);
        }
    }
}
