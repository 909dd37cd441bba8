//! Schema validation performed at registration.

use std::collections::HashSet;
use std::sync::Arc;

use crate::error::{Result, StoreError};

use super::column::ColumnType;
use super::migration::MigrationRule;
use super::registry::TableSchema;

/// Validates a table schema against itself and the tables already registered.
///
/// # Arguments
/// * `schema` - Schema being registered
/// * `registered` - Schemas already in the registry
///
/// # Returns
/// `Result<(), StoreError>` indicating success or the first problem found.
pub fn validate_table_schema(schema: &TableSchema, registered: &[Arc<TableSchema>]) -> Result<()> {
    let invalid = |reason: String| StoreError::InvalidSchema {
        table: schema.name.clone(),
        reason,
    };

    if schema.name.trim().is_empty() {
        return Err(invalid("table name is empty".to_string()));
    }
    if schema.columns.is_empty() {
        return Err(invalid("table has no columns".to_string()));
    }

    // Validate duplicate and empty column names
    let mut seen_names = HashSet::new();
    for column in &schema.columns {
        if column.name.trim().is_empty() {
            return Err(invalid("column name is empty".to_string()));
        }
        if !seen_names.insert(column.name.as_str()) {
            return Err(invalid(format!("duplicate column '{}'", column.name)));
        }
        if let ColumnType::Choice(options) = &column.column_type {
            if options.is_empty() {
                return Err(invalid(format!(
                    "choice column '{}' has no options",
                    column.name
                )));
            }
        }
    }

    // Validate identifier column
    if let Some(spec) = &schema.identifier {
        let column = schema
            .get_column(&spec.column)
            .ok_or_else(|| invalid(format!("identifier column '{}' not found", spec.column)))?;
        match (&column.column_type, &spec.prefix) {
            (ColumnType::Number, None) | (ColumnType::Text, _) => {}
            (ColumnType::Number, Some(prefix)) => {
                return Err(invalid(format!(
                    "numeric identifier column '{}' cannot carry prefix '{}'",
                    spec.column, prefix
                )));
            }
            (other, _) => {
                return Err(invalid(format!(
                    "identifier column '{}' must be number or text, not {}",
                    spec.column, other
                )));
            }
        }
        if let Some(prefix) = &spec.prefix {
            if prefix.is_empty() || prefix.ends_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid(format!("identifier prefix '{}' is not usable", prefix)));
            }
        }
    }

    // Validate migration rules
    for rule in &schema.migrations {
        match rule {
            MigrationRule::DropColumn(name) if schema.get_column(name).is_some() => {
                return Err(invalid(format!("rule drops current column '{}'", name)));
            }
            MigrationRule::RenameColumn { from, to } if from == to => {
                return Err(invalid(format!("rule renames '{}' to itself", from)));
            }
            _ => {}
        }
    }

    // Validate legacy sheet names against other tables
    for legacy in &schema.legacy_names {
        if legacy == &schema.name {
            return Err(invalid(format!("legacy name '{}' equals table name", legacy)));
        }
        if let Some(owner) = registered.iter().find(|other| other.answers_to(legacy)) {
            return Err(invalid(format!(
                "legacy name '{}' already belongs to table '{}'",
                legacy, owner.name
            )));
        }
    }

    Ok(())
}
