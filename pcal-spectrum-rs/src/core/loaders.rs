//! Loader for two-column autocorrelation (pcal) files.
//!
//! Each data line holds a channel index and an autocorrelation value separated
//! by whitespace. Blank lines and `#` comments are ignored. A file is accepted
//! only when its data-line count matches the configured layout exactly.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur during file loading.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("row count mismatch in {path}: expected {expected}, found {found}")]
    RowCountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("parse error in {path} at line {line}: {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("segment layout needs {needed} samples but only {available} are loaded")]
    LayoutOverflow { needed: usize, available: usize },
}

/// Result type for loader operations.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Samples of one autocorrelation file, in file order.
#[derive(Debug, Clone)]
pub struct AutocorrelationFile {
    /// File name without directories.
    pub name: String,
    /// Channel index column.
    pub channels: Vec<i64>,
    /// Autocorrelation value column.
    pub values: Vec<f64>,
    /// Source file path.
    pub source_path: Option<PathBuf>,
}

impl AutocorrelationFile {
    /// Creates a file from in-memory columns.
    pub fn from_columns(name: impl Into<String>, channels: Vec<i64>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            channels,
            values,
            source_path: None,
        }
    }

    /// Returns the number of samples.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no samples were loaded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Index of the first row whose channel is not its zero-based position.
    pub fn first_channel_gap(&self) -> Option<usize> {
        self.channels
            .iter()
            .enumerate()
            .position(|(row, &channel)| channel != row as i64)
    }

    /// File name without its last extension, used to name artifacts.
    pub fn base_name(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Load an autocorrelation file and check its row count.
///
/// # Arguments
///
/// * `path` - Path to the two-column text file
/// * `expected_rows` - Exact number of data lines the file must contain
///
/// # Errors
///
/// Returns `RowCountMismatch` if the number of data lines differs from
/// `expected_rows`, `ParseError` for a line that lacks two numeric columns or
/// whose value is not finite, and `Io` if the file cannot be read.
pub fn load_autocorrelation<P: AsRef<Path>>(
    path: P,
    expected_rows: usize,
) -> Result<AutocorrelationFile> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let reader = BufReader::with_capacity(64 * 1024, file);

    let mut channels = Vec::with_capacity(expected_rows);
    let mut values = Vec::with_capacity(expected_rows);

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line?;
        let stripped = line.trim();
        if stripped.is_empty() || stripped.starts_with('#') {
            continue;
        }

        let mut fields = stripped.split_whitespace();
        let (Some(channel_str), Some(value_str)) = (fields.next(), fields.next()) else {
            return Err(LoaderError::ParseError {
                path: path.to_path_buf(),
                line: line_idx + 1,
                message: "expected two columns".to_string(),
            });
        };

        // Channel indices are sometimes written as floats ("12.0")
        let channel = channel_str
            .parse::<f64>()
            .map(|v| v as i64)
            .map_err(|_| LoaderError::ParseError {
                path: path.to_path_buf(),
                line: line_idx + 1,
                message: format!("invalid channel index: {}", channel_str),
            })?;
        let value = match value_str.parse::<f64>() {
            Ok(v) if v.is_finite() => v,
            Ok(_) => {
                return Err(LoaderError::ParseError {
                    path: path.to_path_buf(),
                    line: line_idx + 1,
                    message: format!("non-finite value: {}", value_str),
                })
            }
            Err(_) => {
                return Err(LoaderError::ParseError {
                    path: path.to_path_buf(),
                    line: line_idx + 1,
                    message: format!("invalid value: {}", value_str),
                })
            }
        };

        channels.push(channel);
        values.push(value);
    }

    if values.len() != expected_rows {
        return Err(LoaderError::RowCountMismatch {
            path: path.to_path_buf(),
            expected: expected_rows,
            found: values.len(),
        });
    }

    let name = path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(AutocorrelationFile {
        name,
        channels,
        values,
        source_path: Some(path.to_path_buf()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_rows(file: &mut NamedTempFile, rows: usize) {
        for i in 0..rows {
            writeln!(file, "{} {}", i, i as f64 * 0.5).unwrap();
        }
        file.flush().unwrap();
    }

    #[test]
    fn test_load_exact_row_count() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        write_rows(&mut file, 10);

        let data = load_autocorrelation(file.path(), 10)?;
        assert_eq!(data.len(), 10);
        assert_eq!(data.channels[3], 3);
        assert_eq!(data.first_channel_gap(), None);
        assert_eq!(data.values[4], 2.0);
        assert_eq!(data.source_path.as_deref(), Some(file.path()));

        Ok(())
    }

    #[test]
    fn test_row_count_mismatch() {
        let mut file = NamedTempFile::new().unwrap();
        write_rows(&mut file, 9);

        match load_autocorrelation(file.path(), 10) {
            Err(LoaderError::RowCountMismatch {
                expected, found, ..
            }) => {
                assert_eq!(expected, 10);
                assert_eq!(found, 9);
            }
            other => panic!("Expected RowCountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_lines_comments_and_tabs() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# channel value").unwrap();
        writeln!(file, "0\t1.5").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   1     -2.5e-3   ").unwrap();
        writeln!(file, "2.0 7").unwrap();
        file.flush().unwrap();

        let data = load_autocorrelation(file.path(), 3)?;
        assert_eq!(data.channels, vec![0, 1, 2]);
        assert_eq!(data.values, vec![1.5, -2.5e-3, 7.0]);

        Ok(())
    }

    #[test]
    fn test_single_column_line_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 1.0").unwrap();
        writeln!(file, "1").unwrap();
        file.flush().unwrap();

        match load_autocorrelation(file.path(), 2) {
            Err(LoaderError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("Expected ParseError, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_value_is_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "0 abc").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            load_autocorrelation(file.path(), 1),
            Err(LoaderError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_non_finite_values_are_parse_errors() {
        for bad in ["nan", "inf", "-inf", "1e400"] {
            let mut file = NamedTempFile::new().unwrap();
            writeln!(file, "0 1.0").unwrap();
            writeln!(file, "1 {}", bad).unwrap();
            writeln!(file, "2 3.0").unwrap();
            file.flush().unwrap();

            match load_autocorrelation(file.path(), 3) {
                Err(LoaderError::ParseError { line, message, .. }) => {
                    assert_eq!(line, 2);
                    assert!(message.contains(bad), "{}", message);
                }
                other => panic!("Expected ParseError for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = load_autocorrelation("/nonexistent/pcal.dat", 1);
        assert!(matches!(result, Err(LoaderError::Io(_))));
    }

    #[test]
    fn test_base_name_strips_last_extension() {
        let data = AutocorrelationFile::from_columns("scan.2024.dat", vec![], vec![]);
        assert_eq!(data.base_name(), "scan.2024");

        let data = AutocorrelationFile::from_columns("noext", vec![], vec![]);
        assert_eq!(data.base_name(), "noext");
        assert!(data.is_empty());
    }

    #[test]
    fn test_first_channel_gap() {
        let data = AutocorrelationFile::from_columns("a.dat", vec![0, 1, 3, 4], vec![0.0; 4]);
        assert_eq!(data.first_channel_gap(), Some(2));

        let data = AutocorrelationFile::from_columns("b.dat", vec![1, 2], vec![0.0; 2]);
        assert_eq!(data.first_channel_gap(), Some(0));
    }
}
