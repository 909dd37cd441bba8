//! Schema registry: current column sets per table and the migrations that
//! bring older sheets up to date.

mod builtin;
mod column;
mod migration;
mod registry;
mod validation;

pub use builtin::{
    farm_registry, FINCA, GASTOS, INGRESOS, INVENTARIO, LABORES, RENTABILIDAD,
};
pub use column::{Column, ColumnType};
pub use migration::{migrate_rows, MigrationOutcome, MigrationRule};
pub use registry::{IdentifierSpec, SchemaRegistry, TableSchema};
pub use validation::validate_table_schema;
