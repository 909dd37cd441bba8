//! Shared fixtures for integration tests.

use std::path::Path;
use std::sync::Arc;

use olivar_core::{farm_registry, Session, StoreConfig};
use rust_xlsxwriter::Workbook;

/// Configuration pointing at `path`, without retry delays.
pub fn config(path: &Path) -> StoreConfig {
    StoreConfig {
        persistence_retry_delay_ms: 0,
        ..StoreConfig::new(path)
    }
}

/// Opens a session over the farm tables.
pub fn open_session(path: &Path) -> Session {
    Session::open(&config(path), Arc::new(farm_registry().unwrap())).unwrap()
}

/// One cell of a fixture sheet.
pub enum Cell<'a> {
    Text(&'a str),
    Number(f64),
    Blank,
}

/// Writes a workbook whose first row of each sheet is the header.
pub fn write_workbook(path: &Path, sheets: &[(&str, Vec<Vec<Cell<'_>>>)]) {
    let mut book = Workbook::new();
    for (name, rows) in sheets {
        let sheet = book.add_worksheet();
        sheet.set_name(*name).unwrap();
        for (r, row) in rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (r, c) = (r as u32, c as u16);
                match cell {
                    Cell::Text(text) => {
                        sheet.write_string(r, c, *text).unwrap();
                    }
                    Cell::Number(number) => {
                        sheet.write_number(r, c, *number).unwrap();
                    }
                    Cell::Blank => {}
                }
            }
        }
    }
    book.save(path).unwrap();
}

/// Header row from column names.
pub fn header<'a>(names: &[&'a str]) -> Vec<Cell<'a>> {
    names.iter().map(|name| Cell::Text(*name)).collect()
}
