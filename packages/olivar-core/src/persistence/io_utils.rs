//! File access helpers for the workbook: error mapping, retries and atomic
//! replacement.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::Path;
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::warn;

use crate::config::StoreConfig;
use crate::error::StoreError;

/// Maps an I/O failure on the workbook file to a store error.
///
/// Interruptions and timeouts become `TransientIoError`, the only kind
/// [`retry_io_operation`] repeats. A denied access usually means a
/// spreadsheet program holds the file, so the message says so.
pub fn classify_io_error(error: std::io::Error, context: &str) -> StoreError {
    match error.kind() {
        ErrorKind::StorageFull => StoreError::DiskFull(format!("{}: {}", context, error)),
        ErrorKind::Interrupted | ErrorKind::WouldBlock | ErrorKind::TimedOut => {
            StoreError::TransientIoError(format!("{}: {}", context, error))
        }
        ErrorKind::PermissionDenied => StoreError::IoError(format!(
            "{}: {} (is the workbook open in another program?)",
            context, error
        )),
        _ => StoreError::IoError(format!("{}: {}", context, error)),
    }
}

/// Runs a workbook read or write, repeating it on transient failures.
///
/// # Arguments
/// * `operation` - The read or write; called at most `persistence_max_retries + 1` times
/// * `config` - Supplies the retry count and the delay between attempts
/// * `action` - Short label for log lines, e.g. `"workbook save"`
///
/// # Returns
/// The first success, the first non-transient error, or the last transient
/// error once retries run out.
pub fn retry_io_operation<F, T>(
    operation: F,
    config: &StoreConfig,
    action: &str,
) -> Result<T, StoreError>
where
    F: Fn() -> Result<T, StoreError>,
{
    let attempts = config.persistence_max_retries.saturating_add(1);
    let delay = Duration::from_millis(config.persistence_retry_delay_ms);

    let mut attempt = 1;
    loop {
        match operation() {
            Err(err @ StoreError::TransientIoError(_)) if attempt < attempts => {
                warn!("{} failed (attempt {}/{}), retrying: {}", action, attempt, attempts, err);
                if !delay.is_zero() {
                    std::thread::sleep(delay);
                }
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// `Path::parent` yields `""` for bare file names; treat that as the current directory.
fn parent_dir_or_dot(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Replaces `dest` with `bytes` without ever exposing a partially written file.
///
/// The bytes go to a temporary file in the destination's directory, which is
/// then renamed over `dest`. If anything fails before the rename, `dest` keeps
/// its previous contents and the temporary file is removed.
///
/// # Arguments
/// * `dest` - Final file path
/// * `bytes` - Complete new contents
/// * `sync` - Fsync the temporary file before renaming
///
/// # Returns
/// `Result<(), StoreError>` with the I/O failure classified.
pub fn write_atomic(dest: &Path, bytes: &[u8], sync: bool) -> Result<(), StoreError> {
    let dir = parent_dir_or_dot(dest);
    fs::create_dir_all(dir)
        .map_err(|e| classify_io_error(e, "Failed to create workbook directory"))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| classify_io_error(e, "Failed to create temp file"))?;
    tmp.write_all(bytes)
        .map_err(|e| classify_io_error(e, "Failed to write temp file"))?;
    tmp.as_file_mut()
        .flush()
        .map_err(|e| classify_io_error(e, "Failed to flush temp file"))?;
    if sync {
        tmp.as_file()
            .sync_all()
            .map_err(|e| classify_io_error(e, "Failed to sync temp file"))?;
    }

    // Atomic rename
    tmp.persist(dest)
        .map_err(|e| classify_io_error(e.error, "Failed to rename temp file over workbook"))?;

    // Directory sync is best effort; the new file is already in place.
    if sync {
        let _ = File::open(dir).and_then(|handle| handle.sync_all());
    }

    Ok(())
}
