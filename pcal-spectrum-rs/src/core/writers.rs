//! Writers for the per-segment numeric artifacts.
//!
//! Both formats are whitespace-separated text without a header, the same
//! shape as the input files:
//! - `.src`: `lag value` rows of the DC-removed symmetrized autocorrelation
//! - `.fft`: `frequency magnitude decibel` rows of the full spectrum

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use thiserror::Error;

use super::transforms::{PowerSpectrum, SymmetrizedAutocorrelation};

/// Errors that can occur during write operations.
#[derive(Error, Debug)]
pub enum WriteError {
    /// Failed to create parent directories.
    #[error("failed to create parent directories for '{path}': {source}")]
    CreateDirectory {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create or open file for writing.
    #[error("failed to create file '{path}': {source}")]
    CreateFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write data to file.
    #[error("failed to write to file '{path}': {source}")]
    WriteFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV writing error.
    #[error("CSV write error for '{path}': {source}")]
    CsvError {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// Result type for write operations.
pub type Result<T> = std::result::Result<T, WriteError>;

/// Creates parent directories for a file path if they don't exist.
pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(|e| WriteError::CreateDirectory {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
    }
    Ok(())
}

/// Creates a buffered writer for the given path.
pub(crate) fn create_buffered_writer(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path).map_err(|e| WriteError::CreateFile {
        path: path.display().to_string(),
        source: e,
    })?;
    Ok(BufWriter::new(file))
}

/// Space-delimited, header-less CSV writer over a fresh file.
fn create_table_writer(path: &Path) -> Result<csv::Writer<BufWriter<File>>> {
    ensure_parent_dirs(path)?;
    let buf_writer = create_buffered_writer(path)?;
    Ok(csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(buf_writer))
}

/// Write the symmetrized autocorrelation as `lag value` rows.
///
/// # Errors
///
/// Returns an error if the parent directory or the file cannot be created or
/// written.
pub fn write_autocorrelation_data(
    path: &Path,
    autocorr: &SymmetrizedAutocorrelation,
) -> Result<()> {
    let mut writer = create_table_writer(path)?;
    let path_str = path.display().to_string();

    for (lag, value) in autocorr.points() {
        writer
            .write_record(&[lag.to_string(), value.to_string()])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write the full spectrum as `frequency magnitude decibel` rows.
///
/// # Errors
///
/// Returns an error if the parent directory or the file cannot be created or
/// written.
pub fn write_spectrum_data(path: &Path, spectrum: &PowerSpectrum) -> Result<()> {
    let mut writer = create_table_writer(path)?;
    let path_str = path.display().to_string();

    for i in 0..spectrum.len() {
        writer
            .write_record(&[
                spectrum.frequencies[i].to_string(),
                spectrum.magnitudes[i].to_string(),
                spectrum.decibels[i].to_string(),
            ])
            .map_err(|e| WriteError::CsvError {
                path: path_str.clone(),
                source: e,
            })?;
    }

    writer.flush().map_err(|e| WriteError::WriteFile {
        path: path_str,
        source: e,
    })?;

    Ok(())
}

/// Write a complete text document, creating parent directories first.
pub fn write_text(path: &Path, content: &str) -> Result<()> {
    ensure_parent_dirs(path)?;
    let mut writer = create_buffered_writer(path)?;
    let path_str = path.display().to_string();

    writer
        .write_all(content.as_bytes())
        .and_then(|_| writer.flush())
        .map_err(|e| WriteError::WriteFile {
            path: path_str,
            source: e,
        })
}
