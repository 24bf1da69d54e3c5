//! Input discovery and exclusion-list filtering.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};
use thiserror::Error;

/// Errors that can occur during filtering operations.
#[derive(Debug, Error)]
pub enum FilteringError {
    #[error("Failed to read directory or exclusion list: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),
}

/// Result type for filtering operations.
pub type Result<T> = std::result::Result<T, FilteringError>;

/// Read the exclusion list: one file name per line.
///
/// Lines are trimmed and blank lines ignored. A missing file is not an error
/// and yields an empty set.
pub fn load_exclusion_list(path: &Path) -> Result<HashSet<String>> {
    if !path.is_file() {
        info!(
            "Exclusion file {} not found, every input file will be analyzed",
            path.display()
        );
        return Ok(HashSet::new());
    }

    let reader = BufReader::new(File::open(path)?);
    let mut names = HashSet::new();
    for line in reader.lines() {
        let line = line?;
        let name = line.trim();
        if !name.is_empty() {
            names.insert(name.to_string());
        }
    }

    info!("Loaded {} excluded file names from {}", names.len(), path.display());
    Ok(names)
}

/// File name of a path as an owned string, empty if it has none.
pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// List candidate input files in a directory.
///
/// Only regular files are returned, sorted by path. When `extension` is given
/// the match is case-insensitive. The exclusion file itself is never returned.
///
/// # Arguments
///
/// * `data_dir` - Directory to scan (not recursive)
/// * `extension` - Optional extension filter, without the dot
/// * `exclude_file` - Path of the exclusion list
///
/// # Errors
///
/// Returns `DirectoryNotFound` if `data_dir` is not a directory.
pub fn find_input_files(
    data_dir: &Path,
    extension: Option<&str>,
    exclude_file: &Path,
) -> Result<Vec<PathBuf>> {
    if !data_dir.is_dir() {
        return Err(FilteringError::DirectoryNotFound(data_dir.to_path_buf()));
    }

    let exclude_canonical = fs::canonicalize(exclude_file).ok();
    let exclude_name = exclude_file.file_name();

    let mut files: Vec<PathBuf> = fs::read_dir(data_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            extension.map_or(true, |wanted| {
                path.extension()
                    .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(wanted))
                    .unwrap_or(false)
            })
        })
        .filter(|path| {
            let same_path = exclude_canonical.is_some()
                && fs::canonicalize(path).ok() == exclude_canonical;
            let same_name_in_dir = exclude_file.parent() == Some(data_dir)
                && path.file_name() == exclude_name;
            !(same_path || same_name_in_dir)
        })
        .collect();

    files.sort();
    debug!("Found {} candidate files in {}", files.len(), data_dir.display());
    Ok(files)
}

/// Split candidates into files to analyze and names that are excluded.
pub fn partition_excluded(
    files: Vec<PathBuf>,
    exclusions: &HashSet<String>,
) -> (Vec<PathBuf>, Vec<String>) {
    let mut kept = Vec::with_capacity(files.len());
    let mut excluded = Vec::new();

    for path in files {
        let name = file_name_of(&path);
        if exclusions.contains(&name) {
            info!("Skipping excluded file {}", name);
            excluded.push(name);
        } else {
            kept.push(path);
        }
    }

    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    #[test]
    fn test_load_exclusion_list() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("exclude");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "bad_scan.dat").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "  other.dat  ").unwrap();
        drop(file);

        let names = load_exclusion_list(&path).unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.contains("bad_scan.dat"));
        assert!(names.contains("other.dat"));
    }

    #[test]
    fn test_missing_exclusion_list_is_empty() {
        let temp = TempDir::new().unwrap();
        let names = load_exclusion_list(&temp.path().join("exclude")).unwrap();
        assert!(names.is_empty());
    }

    #[test]
    fn test_find_input_files_skips_dirs_and_exclusion_file() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(base, "b.dat");
        touch(base, "a.dat");
        touch(base, "exclude");
        fs::create_dir(base.join("nested")).unwrap();

        let files = find_input_files(base, None, &base.join("exclude")).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name_of(p)).collect();
        assert_eq!(names, vec!["a.dat", "b.dat"]);
    }

    #[test]
    fn test_find_input_files_extension_filter() {
        let temp = TempDir::new().unwrap();
        let base = temp.path();
        touch(base, "one.DAT");
        touch(base, "two.dat");
        touch(base, "notes.txt");
        touch(base, "noext");

        let files = find_input_files(base, Some("dat"), &base.join("exclude")).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name_of(p)).collect();
        assert_eq!(names, vec!["one.DAT", "two.dat"]);
    }

    #[test]
    fn test_find_input_files_missing_dir() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        assert!(matches!(
            find_input_files(&missing, None, &missing.join("exclude")),
            Err(FilteringError::DirectoryNotFound(_))
        ));
    }

    #[test]
    fn test_partition_excluded() {
        let files = vec![PathBuf::from("d/a.dat"), PathBuf::from("d/b.dat")];
        let exclusions: HashSet<String> = ["b.dat".to_string()].into_iter().collect();

        let (kept, excluded) = partition_excluded(files, &exclusions);
        assert_eq!(kept, vec![PathBuf::from("d/a.dat")]);
        assert_eq!(excluded, vec!["b.dat".to_string()]);
    }
}
