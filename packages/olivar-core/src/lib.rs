//! Spreadsheet-backed record store for olive-farm bookkeeping.
//!
//! Provides schema registry with load-time migrations, per-table CRUD,
//! identifier allocation, atomic workbook persistence, and a write-through
//! session cache.

pub mod config;
pub mod error;
pub mod persistence;
pub mod record;
pub mod schema;
pub mod session;
pub mod table;
pub mod value;
pub mod workbook;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use record::Record;
pub use schema::{farm_registry, SchemaRegistry, TableSchema};
pub use session::Session;
pub use table::{RecordId, RecordRef, Table, MAX_CELL_INTEGER};
pub use value::Value;
pub use workbook::Workbook;
