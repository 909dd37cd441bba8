//! Record store configuration.

use std::path::PathBuf;

/// Default workbook file name, relative to the working directory.
pub const DEFAULT_WORKBOOK_FILE: &str = "finca_olivar_datos.xlsx";

/// Record store configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Workbook file holding every table as a named sheet
    pub workbook_path: PathBuf,
    /// Maximum retry attempts for transient I/O errors
    pub persistence_max_retries: u32,
    /// Delay between retry attempts in milliseconds
    pub persistence_retry_delay_ms: u64,
    /// Fsync the temporary file before renaming it over the workbook
    pub sync_on_save: bool,
}

impl StoreConfig {
    /// Creates a configuration for the given workbook path with default tuning.
    pub fn new(workbook_path: impl Into<PathBuf>) -> Self {
        Self {
            workbook_path: workbook_path.into(),
            ..Default::default()
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            workbook_path: PathBuf::from(DEFAULT_WORKBOOK_FILE),
            persistence_max_retries: 3,      // Default retry attempts
            persistence_retry_delay_ms: 100, // 100ms delay between retries
            sync_on_save: true,
        }
    }
}
