//! Workbook file codec: `.xlsx` sheets to raw rows and back.
//!
//! Reading goes through calamine, writing through rust_xlsxwriter. Row 1 of
//! every sheet is the header; each following row is one record.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Datelike, Days, NaiveDate};
use rust_xlsxwriter::{ExcelDateTime, Format, Worksheet};

use crate::error::{Result, StoreError};
use crate::value::{parse_date, Value};
use crate::workbook::Workbook;

use super::io_utils::classify_io_error;

/// Number format applied to date cells.
const DATE_NUMBER_FORMAT: &str = "yyyy-mm-dd";

/// A sheet as found on disk, before migration.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSheet {
    /// Sheet name
    pub name: String,
    /// Header row, trimmed
    pub header: Vec<String>,
    /// Data rows, positionally aligned with `header`
    pub rows: Vec<Vec<Value>>,
}

/// Reads every sheet of the workbook at `path`.
///
/// # Arguments
/// * `path` - Workbook file; must exist
///
/// # Returns
/// `Result<Vec<RawSheet>, StoreError>` with sheets in file order, or
/// `WorkbookFormat` if the file is not a readable spreadsheet.
pub fn read_sheets(path: &Path) -> Result<Vec<RawSheet>> {
    let mut workbook = open_workbook_auto(path).map_err(|e| match e {
        calamine::Error::Io(io) => classify_io_error(io, "Failed to open workbook"),
        other => StoreError::WorkbookFormat(format!("Failed to open {:?}: {}", path, other)),
    })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut sheets = Vec::with_capacity(sheet_names.len());
    for name in sheet_names {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            StoreError::WorkbookFormat(format!("Failed to read sheet '{}': {}", name, e))
        })?;

        let mut rows = range.rows();
        let header = rows
            .next()
            .map(|cells| cells.iter().map(header_name).collect())
            .unwrap_or_default();
        let rows = rows
            .map(|cells| cells.iter().map(cell_value).collect())
            .collect();

        sheets.push(RawSheet { name, header, rows });
    }
    Ok(sheets)
}

fn header_name(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.trim().to_string(),
        other => cell_value(other).to_string().trim().to_string(),
    }
}

/// Converts a calamine cell to a value.
fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Empty,
        Data::String(text) => Value::from(text.as_str()),
        Data::Float(number) => Value::Number(*number),
        Data::Int(number) => Value::Number(*number as f64),
        Data::Bool(flag) => Value::Text(flag.to_string()),
        Data::DateTime(datetime) => date_from_serial(datetime.as_f64())
            .map(Value::Date)
            .unwrap_or(Value::Number(datetime.as_f64())),
        Data::DateTimeIso(text) => {
            parse_date(text).map_or_else(|| Value::from(text.as_str()), Value::Date)
        }
        Data::Error(error) => Value::Text(error.to_string()),
        other => Value::from(other.to_string()),
    }
}

/// Serial 61 is 1900-03-01; spreadsheets count a 1900-02-29 that never existed.
const FIRST_SERIAL_AFTER_PHANTOM_LEAP_DAY: u64 = 61;

/// Converts a spreadsheet date serial to a date. The time-of-day fraction is
/// discarded.
///
/// Serials from 61 on count days since 1899-12-30. Earlier ones count from
/// 1899-12-31, so 1 is 1900-01-01; the phantom serial 60 reads as 1900-03-01.
fn date_from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as u64;
    let epoch = if days < FIRST_SERIAL_AFTER_PHANTOM_LEAP_DAY {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    epoch.checked_add_days(Days::new(days))
}

/// Serializes every table of `workbook` to `.xlsx` bytes, one sheet per table.
///
/// # Returns
/// `Result<Vec<u8>, StoreError>` containing the file contents, or
/// `WorkbookFormat` if the writer rejects a sheet.
pub fn encode_workbook(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut book = rust_xlsxwriter::Workbook::new();
    let header_format = Format::new().set_bold();
    let date_format = Format::new().set_num_format(DATE_NUMBER_FORMAT);

    for table in workbook.tables() {
        let sheet = book.add_worksheet();
        sheet.set_name(table.name()).map_err(format_error)?;

        for (col, name) in table.schema().column_names().into_iter().enumerate() {
            sheet
                .write_string_with_format(0, column_index(col)?, name, &header_format)
                .map_err(format_error)?;
        }

        for (index, record) in table.records().iter().enumerate() {
            let row = row_index(index + 1)?;
            for (col, value) in record.values().enumerate() {
                write_cell(sheet, row, column_index(col)?, value, &date_format)?;
            }
        }

        sheet.autofit();
    }

    book.save_to_buffer().map_err(format_error)
}

fn write_cell(
    sheet: &mut Worksheet,
    row: u32,
    col: u16,
    value: &Value,
    date_format: &Format,
) -> Result<()> {
    match value {
        Value::Empty => return Ok(()),
        Value::Text(text) => sheet.write_string(row, col, text).map(|_| ()),
        Value::Number(number) => sheet.write_number(row, col, *number).map(|_| ()),
        Value::Date(date) => match excel_date(date) {
            Some(datetime) => sheet
                .write_datetime_with_format(row, col, &datetime, date_format)
                .map(|_| ()),
            // Outside the spreadsheet calendar; keep it readable as text.
            None => sheet.write_string(row, col, value.to_string()).map(|_| ()),
        },
    }
    .map_err(format_error)
}

fn excel_date(date: &NaiveDate) -> Option<ExcelDateTime> {
    let year = u16::try_from(date.year()).ok()?;
    ExcelDateTime::from_ymd(year, date.month() as u8, date.day() as u8).ok()
}

fn row_index(index: usize) -> Result<u32> {
    u32::try_from(index)
        .map_err(|_| StoreError::WorkbookFormat(format!("row {} out of range", index)))
}

fn column_index(index: usize) -> Result<u16> {
    u16::try_from(index)
        .map_err(|_| StoreError::WorkbookFormat(format!("column {} out of range", index)))
}

fn format_error(error: rust_xlsxwriter::XlsxError) -> StoreError {
    StoreError::WorkbookFormat(format!("{:?}", error))
}
