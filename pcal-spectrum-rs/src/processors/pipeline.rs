//! Batch pipeline: per-file processing folded over the input list.
//!
//! Every file runs load → split → DC removal + symmetrization → spectrum →
//! artifacts. A file that fails to load is skipped; an artifact that fails to
//! write is omitted. Both become [`BatchWarning`]s and the batch continues.

use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use log::{debug, info, warn};
use thiserror::Error;

use super::filtering::{
    file_name_of, find_input_files, load_exclusion_list, partition_excluded, FilteringError,
};
use super::report::ReportBuilder;
use crate::config::{ConfigError, PipelineConfig};
use crate::core::loaders::{load_autocorrelation, LoaderError};
use crate::core::segments::{split_segments, Segment};
use crate::core::transforms::{prepare_autocorrelation, SpectrumAnalyzer};
use crate::core::writers::{write_autocorrelation_data, write_spectrum_data, WriteError};
use crate::visualization::{
    plot_autocorrelation, plot_spectrum, write_interactive_spectrum, PlotExtents,
};

/// Unrecoverable errors that abort a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filtering(#[from] FilteringError),

    #[error("cannot create output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write report: {0}")]
    Report(#[source] WriteError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Recoverable problems collected during a batch.
#[derive(Debug, Error)]
pub enum BatchWarning {
    #[error("skipped {file}: {source}")]
    Skipped {
        file: String,
        #[source]
        source: LoaderError,
    },

    #[error("{file}: could not write {artifact}: {reason}")]
    ArtifactFailed {
        file: String,
        artifact: String,
        reason: String,
    },
}

/// Artifact file names written for one segment, relative to the output dir.
#[derive(Debug, Clone, Default)]
pub struct SegmentArtifacts {
    /// 1-based segment number.
    pub index: usize,
    /// Number of one-sided samples in the segment.
    pub samples: usize,
    pub autocorr_data: Option<String>,
    pub spectrum_data: Option<String>,
    pub autocorr_png: Option<String>,
    pub spectrum_png: Option<String>,
    pub interactive_html: Option<String>,
    pub autocorr_extents: Option<PlotExtents>,
    pub spectrum_extents: Option<PlotExtents>,
}

impl SegmentArtifacts {
    /// Returns true if at least one artifact was written.
    pub fn has_any(&self) -> bool {
        self.autocorr_data.is_some()
            || self.spectrum_data.is_some()
            || self.autocorr_png.is_some()
            || self.spectrum_png.is_some()
            || self.interactive_html.is_some()
    }

    /// Names of all written artifacts.
    pub fn written(&self) -> Vec<&str> {
        [
            &self.autocorr_data,
            &self.spectrum_data,
            &self.autocorr_png,
            &self.spectrum_png,
            &self.interactive_html,
        ]
        .into_iter()
        .filter_map(|name| name.as_deref())
        .collect()
    }
}

/// Artifacts of one processed input file, segments in file order.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file_name: String,
    pub segments: Vec<SegmentArtifacts>,
}

impl FileReport {
    /// Returns true if any segment produced an artifact.
    pub fn has_artifacts(&self) -> bool {
        self.segments.iter().any(SegmentArtifacts::has_any)
    }
}

/// Result of folding the pipeline over a list of files.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// Files that produced at least one artifact, in processing order.
    pub reports: Vec<FileReport>,
    /// Names dropped by the exclusion list.
    pub excluded: Vec<String>,
    pub warnings: Vec<BatchWarning>,
}

impl BatchOutcome {
    /// Number of files skipped because they failed to load.
    pub fn skipped(&self) -> usize {
        self.warnings
            .iter()
            .filter(|w| matches!(w, BatchWarning::Skipped { .. }))
            .count()
    }
}

/// Summary of a full run.
#[derive(Debug)]
pub struct RunSummary {
    /// Candidate files found before exclusion.
    pub candidates: usize,
    pub outcome: BatchOutcome,
    pub report_path: PathBuf,
}

/// Artifact file names for one segment of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactNames {
    pub autocorr_data: String,
    pub spectrum_data: String,
    pub autocorr_png: String,
    pub spectrum_png: String,
    pub interactive_html: String,
}

impl ArtifactNames {
    /// Names derived from `<base_name>_pcal<index>`.
    pub fn new(base_name: &str, index: usize) -> Self {
        let prefix = format!("{}_pcal{}", base_name, index);
        Self {
            autocorr_data: format!("{}.src", prefix),
            spectrum_data: format!("{}.fft", prefix),
            autocorr_png: format!("{}_autocorr.png", prefix),
            spectrum_png: format!("{}.png", prefix),
            interactive_html: format!("{}_interactive.html", prefix),
        }
    }
}

/// Keep the artifact name on success, record a warning on failure.
fn record<T, E: Display>(
    result: std::result::Result<T, E>,
    file: &str,
    artifact: &str,
    warnings: &mut Vec<BatchWarning>,
) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("{}: could not write {}: {}", file, artifact, e);
            warnings.push(BatchWarning::ArtifactFailed {
                file: file.to_string(),
                artifact: artifact.to_string(),
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Compute and write every artifact of one segment.
pub fn process_segment(
    segment: &Segment<'_>,
    file_name: &str,
    base_name: &str,
    output_dir: &Path,
    analyzer: &mut SpectrumAnalyzer,
    warnings: &mut Vec<BatchWarning>,
) -> SegmentArtifacts {
    let names = ArtifactNames::new(base_name, segment.index);
    let autocorr = prepare_autocorrelation(segment.samples);
    let spectrum = analyzer.compute(&autocorr.values);
    let display = spectrum.display_points();
    let title = format!("{} {}", file_name, segment.label());

    debug!(
        "{} {}: {} samples -> {} lags, {} displayed bins",
        file_name,
        segment.label(),
        segment.len(),
        autocorr.len(),
        display.len()
    );

    let mut artifacts = SegmentArtifacts {
        index: segment.index,
        samples: segment.len(),
        ..SegmentArtifacts::default()
    };

    let path = output_dir.join(&names.autocorr_data);
    artifacts.autocorr_data = record(
        write_autocorrelation_data(&path, &autocorr),
        file_name,
        &names.autocorr_data,
        warnings,
    )
    .map(|_| names.autocorr_data.clone());

    let path = output_dir.join(&names.spectrum_data);
    artifacts.spectrum_data = record(
        write_spectrum_data(&path, &spectrum),
        file_name,
        &names.spectrum_data,
        warnings,
    )
    .map(|_| names.spectrum_data.clone());

    let path = output_dir.join(&names.autocorr_png);
    artifacts.autocorr_extents = record(
        plot_autocorrelation(&path, &autocorr),
        file_name,
        &names.autocorr_png,
        warnings,
    );
    artifacts.autocorr_png = artifacts.autocorr_extents.map(|_| names.autocorr_png.clone());

    let path = output_dir.join(&names.spectrum_png);
    artifacts.spectrum_extents = record(
        plot_spectrum(&path, &display),
        file_name,
        &names.spectrum_png,
        warnings,
    );
    artifacts.spectrum_png = artifacts.spectrum_extents.map(|_| names.spectrum_png.clone());

    let path = output_dir.join(&names.interactive_html);
    artifacts.interactive_html = record(
        write_interactive_spectrum(&path, &title, &display),
        file_name,
        &names.interactive_html,
        warnings,
    )
    .map(|_| names.interactive_html.clone());

    artifacts
}

/// Process one input file into its segment artifacts.
///
/// Artifact write failures are appended to `warnings`; only load and layout
/// errors fail the whole file.
pub fn process_file(
    path: &Path,
    config: &PipelineConfig,
    analyzer: &mut SpectrumAnalyzer,
    warnings: &mut Vec<BatchWarning>,
) -> std::result::Result<FileReport, LoaderError> {
    let data = load_autocorrelation(path, config.layout.expected_rows)?;
    if let Some(row) = data.first_channel_gap() {
        warn!(
            "{}: channel index {} at row {} is out of sequence",
            data.name,
            data.channels[row],
            row + 1
        );
    }
    let segments = split_segments(&data.values, &config.layout.segment_lengths)?;
    let base_name = data.base_name();

    let segments = segments
        .iter()
        .map(|segment| {
            process_segment(
                segment,
                &data.name,
                &base_name,
                &config.output.output_dir,
                analyzer,
                warnings,
            )
        })
        .collect();

    Ok(FileReport {
        file_name: data.name,
        segments,
    })
}

/// Fold the pipeline over `files`, one file at a time.
///
/// Files that produce no artifact at all are left out of `reports`.
pub fn process_batch(
    files: &[PathBuf],
    config: &PipelineConfig,
    progress: &ProgressBar,
) -> BatchOutcome {
    let mut analyzer = SpectrumAnalyzer::from_config(&config.spectrum);

    files.iter().fold(BatchOutcome::default(), |mut outcome, path| {
        let name = file_name_of(path);
        progress.set_message(name.clone());
        info!("Processing {}", name);

        match process_file(path, config, &mut analyzer, &mut outcome.warnings) {
            Ok(report) if report.has_artifacts() => outcome.reports.push(report),
            Ok(_) => warn!("{} produced no artifacts", name),
            Err(e) => {
                warn!("Skipping {}: {}", name, e);
                outcome.warnings.push(BatchWarning::Skipped {
                    file: name,
                    source: e,
                });
            }
        }

        progress.inc(1);
        outcome
    })
}

/// Create the output directory, failing the run if that is impossible.
pub fn prepare_output_dir(config: &PipelineConfig) -> Result<()> {
    let dir = &config.output.output_dir;
    fs::create_dir_all(dir).map_err(|e| PipelineError::OutputDirectory {
        path: dir.clone(),
        source: e,
    })
}

/// Run the full batch: discovery, exclusion, processing and the report.
///
/// Setup problems (invalid config, missing input directory, unusable output
/// directory) fail before any file is touched. `progress` gets its length set
/// to the number of files to process.
pub fn run_pipeline(config: &PipelineConfig, progress: &ProgressBar) -> Result<RunSummary> {
    config.validate()?;

    let input = &config.input;
    let candidates = find_input_files(
        &input.data_dir,
        input.extension.as_deref(),
        &input.exclude_file,
    )?;
    let exclusions = load_exclusion_list(&input.exclude_file)?;
    prepare_output_dir(config)?;

    let candidate_count = candidates.len();
    let (files, excluded) = partition_excluded(candidates, &exclusions);
    info!(
        "Found {} files to analyze ({} excluded)",
        files.len(),
        excluded.len()
    );

    progress.set_length(files.len() as u64);
    let mut outcome = process_batch(&files, config, progress);
    outcome.excluded = excluded;

    let mut builder = ReportBuilder::default();
    for report in &outcome.reports {
        builder.add_file(report.clone());
    }
    let report_path = config.report_path();
    builder.write(&report_path).map_err(PipelineError::Report)?;
    info!("Report written to {}", report_path.display());

    Ok(RunSummary {
        candidates: candidate_count,
        outcome,
        report_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    const ROWS: usize = 16388;

    fn write_pcal_file(
        dir: &Path,
        name: &str,
        rows: usize,
        value: impl Fn(usize) -> f64,
    ) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::io::BufWriter::new(File::create(&path).unwrap());
        for i in 0..rows {
            writeln!(file, "{} {}", i, value(i)).unwrap();
        }
        file.flush().unwrap();
        path
    }

    fn decaying(i: usize) -> f64 {
        let lag = (i % 4097) as f64;
        1.0 + (-lag / 50.0).exp() * (lag * 0.3).cos()
    }

    fn test_config(base: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.input.data_dir = base.join("data");
        config.input.exclude_file = base.join("data").join("exclude");
        config.output.output_dir = base.join("output");
        fs::create_dir_all(&config.input.data_dir).unwrap();
        config
    }

    #[test]
    fn test_artifact_names() {
        let names = ArtifactNames::new("scan", 3);
        assert_eq!(names.autocorr_data, "scan_pcal3.src");
        assert_eq!(names.spectrum_data, "scan_pcal3.fft");
        assert_eq!(names.autocorr_png, "scan_pcal3_autocorr.png");
        assert_eq!(names.spectrum_png, "scan_pcal3.png");
        assert_eq!(names.interactive_html, "scan_pcal3_interactive.html");
    }

    #[test]
    fn test_constant_file_gives_zero_autocorrelation_and_floor_spectrum() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let path = write_pcal_file(&config.input.data_dir, "flat.dat", ROWS, |_| 5.0);
        prepare_output_dir(&config).unwrap();

        let mut analyzer = SpectrumAnalyzer::from_config(&config.spectrum);
        let mut warnings = Vec::new();
        let report = process_file(&path, &config, &mut analyzer, &mut warnings).unwrap();

        assert!(warnings.is_empty());
        assert_eq!(report.segments.len(), 4);

        let src = fs::read_to_string(config.output.output_dir.join("flat_pcal1.src")).unwrap();
        assert_eq!(src.lines().count(), 2 * 4097 - 1);
        for line in src.lines() {
            let value: f64 = line.split(' ').nth(1).unwrap().parse().unwrap();
            assert_eq!(value, 0.0);
        }

        let fft = fs::read_to_string(config.output.output_dir.join("flat_pcal4.fft")).unwrap();
        assert_eq!(fft.lines().count(), 2 * 4096 - 1);
        for line in fft.lines() {
            let db: f64 = line.split(' ').nth(2).unwrap().parse().unwrap();
            assert!((db - (-240.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn test_process_file_writes_every_artifact() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let path = write_pcal_file(&config.input.data_dir, "scan.dat", ROWS, decaying);
        prepare_output_dir(&config).unwrap();

        let mut analyzer = SpectrumAnalyzer::from_config(&config.spectrum);
        let mut warnings = Vec::new();
        let report = process_file(&path, &config, &mut analyzer, &mut warnings).unwrap();

        assert!(warnings.is_empty());
        let indices: Vec<usize> = report.segments.iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![1, 2, 3, 4]);
        let samples: Vec<usize> = report.segments.iter().map(|s| s.samples).collect();
        assert_eq!(samples, vec![4097, 4097, 4097, 4096]);

        for segment in &report.segments {
            assert_eq!(segment.written().len(), 5);
            for name in segment.written() {
                assert!(config.output.output_dir.join(name).is_file(), "missing {}", name);
            }
        }
    }

    #[test]
    fn test_unwritable_output_records_artifact_warnings() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        let path = write_pcal_file(&config.input.data_dir, "scan.dat", ROWS, decaying);
        // A regular file where the output directory should be
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "x").unwrap();
        config.output.output_dir = blocker;

        let mut analyzer = SpectrumAnalyzer::from_config(&config.spectrum);
        let mut warnings = Vec::new();
        let report = process_file(&path, &config, &mut analyzer, &mut warnings).unwrap();

        assert!(!report.has_artifacts());
        assert_eq!(warnings.len(), 4 * 5);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, BatchWarning::ArtifactFailed { .. })));
    }

    #[test]
    fn test_excluded_file_produces_nothing() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        write_pcal_file(&config.input.data_dir, "keep.dat", ROWS, decaying);
        write_pcal_file(&config.input.data_dir, "skip.dat", ROWS, decaying);
        fs::write(&config.input.exclude_file, "skip.dat\n").unwrap();

        let summary = run_pipeline(&config, &ProgressBar::hidden()).unwrap();

        assert_eq!(summary.candidates, 2);
        assert_eq!(summary.outcome.excluded, vec!["skip.dat".to_string()]);
        assert_eq!(summary.outcome.reports.len(), 1);

        let outputs: Vec<String> = fs::read_dir(&config.output.output_dir)
            .unwrap()
            .map(|e| file_name_of(&e.unwrap().path()))
            .collect();
        assert!(outputs.iter().all(|name| !name.starts_with("skip")));

        let report = fs::read_to_string(&summary.report_path).unwrap();
        assert!(!report.contains("skip.dat"));
        assert!(report.contains("Data file: keep.dat"));
    }

    #[test]
    fn test_short_file_is_skipped_and_batch_continues() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        write_pcal_file(&config.input.data_dir, "good.dat", ROWS, decaying);
        write_pcal_file(&config.input.data_dir, "short.dat", 16000, decaying);

        let summary = run_pipeline(&config, &ProgressBar::hidden()).unwrap();
        let outcome = &summary.outcome;

        assert_eq!(outcome.skipped(), 1);
        match &outcome.warnings[0] {
            BatchWarning::Skipped {
                file,
                source: LoaderError::RowCountMismatch { expected, found, .. },
            } => {
                assert_eq!(file, "short.dat");
                assert_eq!(*expected, ROWS);
                assert_eq!(*found, 16000);
            }
            other => panic!("Expected row count warning, got {:?}", other),
        }

        assert_eq!(outcome.reports.len(), 1);
        assert_eq!(outcome.reports[0].file_name, "good.dat");

        let report = fs::read_to_string(&summary.report_path).unwrap();
        assert!(report.contains("Data file: good.dat"));
        assert!(!report.contains("short.dat"));
    }

    #[test]
    fn test_nan_row_skips_only_that_file() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        write_pcal_file(&config.input.data_dir, "a.dat", ROWS, decaying);
        write_pcal_file(&config.input.data_dir, "c.dat", ROWS, decaying);

        let mut rows = String::new();
        for i in 0..ROWS {
            if i == 9 {
                rows.push_str("9 nan\n");
            } else {
                rows.push_str(&format!("{} {}\n", i, decaying(i)));
            }
        }
        fs::write(config.input.data_dir.join("b.dat"), rows).unwrap();

        let summary = run_pipeline(&config, &ProgressBar::hidden()).unwrap();
        let outcome = &summary.outcome;

        assert_eq!(outcome.skipped(), 1);
        match &outcome.warnings[0] {
            BatchWarning::Skipped {
                file,
                source: LoaderError::ParseError { line, .. },
            } => {
                assert_eq!(file, "b.dat");
                assert_eq!(*line, 10);
            }
            other => panic!("Expected parse warning, got {:?}", other),
        }

        let names: Vec<&str> = outcome.reports.iter().map(|r| r.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.dat", "c.dat"]);
        assert!(!config.output.output_dir.join("b_pcal1.png").exists());

        let report = fs::read_to_string(&summary.report_path).unwrap();
        assert!(report.contains("Data file: a.dat"));
        assert!(report.contains("Data file: c.dat"));
        assert!(!report.contains("b.dat"));
    }

    #[test]
    fn test_two_files_give_two_report_sections() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        write_pcal_file(&config.input.data_dir, "a.dat", ROWS, decaying);
        write_pcal_file(&config.input.data_dir, "b.dat", ROWS, |i| decaying(i) * 2.0);

        let summary = run_pipeline(&config, &ProgressBar::hidden()).unwrap();

        assert!(summary.outcome.warnings.is_empty());
        let report = fs::read_to_string(&summary.report_path).unwrap();
        assert_eq!(report.matches("<div class=\"file-section\">").count(), 2);
        assert_eq!(report.matches("<div class=\"segment\"").count(), 8);
        for base in ["a", "b"] {
            let positions: Vec<usize> = (1..=4)
                .map(|i| report.find(&format!("id=\"{}.dat-pcal{}\"", base, i)).unwrap())
                .collect();
            assert!(positions.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_missing_input_dir_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.input.data_dir = temp.path().join("missing");

        let result = run_pipeline(&config, &ProgressBar::hidden());
        assert!(matches!(
            result,
            Err(PipelineError::Filtering(FilteringError::DirectoryNotFound(_)))
        ));
        assert!(!config.output.output_dir.exists());
    }

    #[test]
    fn test_invalid_config_is_fatal() {
        let temp = TempDir::new().unwrap();
        let mut config = test_config(temp.path());
        config.layout.segment_lengths = vec![20000];

        assert!(matches!(
            run_pipeline(&config, &ProgressBar::hidden()),
            Err(PipelineError::Config(_))
        ));
    }
}
