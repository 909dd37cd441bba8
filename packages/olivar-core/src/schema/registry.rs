//! Table schemas and the registry that owns them.

use std::sync::Arc;

use tracing::debug;

use crate::error::{Result, StoreError};
use crate::value::Value;

use super::column::Column;
use super::migration::{migrate_rows, MigrationOutcome, MigrationRule};
use super::validation::validate_table_schema;

/// Identifier column settings for tables addressed by identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSpec {
    /// Column holding the identifier
    pub column: String,
    /// Text prefix for identifiers like `P7`; `None` for plain integers
    pub prefix: Option<String>,
}

/// Current shape of one table plus the rules that bring older shapes up to date.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    /// Table name, also the sheet name
    pub name: String,
    /// Columns in display order
    pub columns: Vec<Column>,
    /// Identifier column, if records are addressed by identity
    pub identifier: Option<IdentifierSpec>,
    /// Migration rules applied in order on load
    pub migrations: Vec<MigrationRule>,
    /// Sheet names this table was stored under by earlier releases
    pub legacy_names: Vec<String>,
}

impl TableSchema {
    /// Starts a schema with no columns.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            identifier: None,
            migrations: Vec::new(),
            legacy_names: Vec::new(),
        }
    }

    /// Appends a column.
    pub fn column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Marks `column` as a plain integer identifier.
    pub fn identifier(mut self, column: impl Into<String>) -> Self {
        self.identifier = Some(IdentifierSpec {
            column: column.into(),
            prefix: None,
        });
        self
    }

    /// Marks `column` as a prefixed identifier (`P1`, `P2`, ...).
    pub fn prefixed_identifier(mut self, column: impl Into<String>, prefix: impl Into<String>) -> Self {
        self.identifier = Some(IdentifierSpec {
            column: column.into(),
            prefix: Some(prefix.into()),
        });
        self
    }

    /// Appends a migration rule.
    pub fn migration(mut self, rule: MigrationRule) -> Self {
        self.migrations.push(rule);
        self
    }

    /// Records a sheet name used by an earlier release.
    pub fn legacy_name(mut self, name: impl Into<String>) -> Self {
        self.legacy_names.push(name.into());
        self
    }

    /// Looks up a column by name.
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Returns the identifier column definition, if any.
    pub fn identifier_column(&self) -> Option<&Column> {
        self.identifier
            .as_ref()
            .and_then(|spec| self.get_column(&spec.column))
    }

    /// Returns true if `name` is the identifier column.
    pub fn is_identifier(&self, name: &str) -> bool {
        self.identifier
            .as_ref()
            .is_some_and(|spec| spec.column == name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Returns true if the sheet name is this table's name or one of its legacy names.
    pub fn answers_to(&self, sheet_name: &str) -> bool {
        self.name == sheet_name || self.legacy_names.iter().any(|name| name == sheet_name)
    }
}

/// Registry of table schemas, in sheet order.
///
/// Built once at startup and shared read-only through an `Arc`.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    tables: Vec<Arc<TableSchema>>,
}

impl SchemaRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self { tables: Vec::new() }
    }

    /// Registers a table schema.
    ///
    /// # Arguments
    /// * `schema` - Schema to add; validated before insertion
    ///
    /// # Returns
    /// `Ok(())` if registered, `Err(StoreError)` if the name is taken or the schema is invalid.
    pub fn register(&mut self, schema: TableSchema) -> Result<()> {
        if self.tables.iter().any(|existing| existing.answers_to(&schema.name)) {
            return Err(StoreError::TableAlreadyExists(schema.name));
        }
        validate_table_schema(&schema, &self.tables)?;

        debug!(
            "Registered table '{}' with {} columns",
            schema.name,
            schema.columns.len()
        );
        self.tables.push(Arc::new(schema));
        Ok(())
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, schema: TableSchema) -> Result<Self> {
        self.register(schema)?;
        Ok(self)
    }

    /// Returns the current schema of `table`.
    ///
    /// # Returns
    /// The schema, or `StoreError::UnknownTable` if the registry does not know the name.
    pub fn current_schema(&self, table: &str) -> Result<&Arc<TableSchema>> {
        self.tables
            .iter()
            .find(|schema| schema.name == table)
            .ok_or_else(|| StoreError::UnknownTable {
                table: table.to_string(),
            })
    }

    /// Returns true if `table` is registered under its current name.
    pub fn contains(&self, table: &str) -> bool {
        self.tables.iter().any(|schema| schema.name == table)
    }

    /// Finds the schema a sheet belongs to, by current or legacy name.
    pub fn resolve_sheet(&self, sheet_name: &str) -> Option<&Arc<TableSchema>> {
        let sheet_name = sheet_name.trim();
        self.tables
            .iter()
            .find(|schema| schema.name == sheet_name)
            .or_else(|| self.tables.iter().find(|schema| schema.answers_to(sheet_name)))
    }

    /// Registered table names in sheet order.
    pub fn table_names(&self) -> Vec<String> {
        self.tables.iter().map(|schema| schema.name.clone()).collect()
    }

    /// Iterates over schemas in sheet order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TableSchema>> {
        self.tables.iter()
    }

    /// Number of registered tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Returns true if no tables are registered.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Migrates rows read from disk to the current schema of `table`.
    ///
    /// # Arguments
    /// * `table` - Table name (current name)
    /// * `on_disk_columns` - Header row found in the file
    /// * `rows` - Data rows aligned with `on_disk_columns`
    ///
    /// # Returns
    /// The migration outcome, or `StoreError::UnknownTable`.
    pub fn migrate(
        &self,
        table: &str,
        on_disk_columns: &[String],
        rows: Vec<Vec<Value>>,
    ) -> Result<MigrationOutcome> {
        let schema = self.current_schema(table)?;
        Ok(migrate_rows(schema, on_disk_columns, rows))
    }
}
