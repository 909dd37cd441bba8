//! Tables of records, identifier allocation, and aggregate queries.

mod identifier;
mod query;
#[allow(clippy::module_inception)]
mod table;

pub use identifier::{RecordId, MAX_CELL_INTEGER};
pub use table::{RecordRef, Table};
