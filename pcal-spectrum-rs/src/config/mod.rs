//! Configuration types for the spectrum pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Where input files and the exclusion list are read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Directory scanned for autocorrelation files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// File listing names to skip, one per line
    #[serde(default = "default_exclude_file")]
    pub exclude_file: PathBuf,

    /// Only accept files with this extension (case-insensitive, no dot)
    #[serde(default)]
    pub extension: Option<String>,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_exclude_file() -> PathBuf {
    default_data_dir().join("exclude")
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            exclude_file: default_exclude_file(),
            extension: None,
        }
    }
}

/// Where artifacts and the report are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving every artifact and the report
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// File name of the HTML report inside `output_dir`
    #[serde(default = "default_report_name")]
    pub report_name: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_report_name() -> String {
    "raport.html".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            report_name: default_report_name(),
        }
    }
}

/// Parameters of the spectrum computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpectrumConfig {
    /// Sampling frequency in Hz; only affects the frequency axis
    #[serde(default = "default_sampling_rate")]
    pub sampling_rate_hz: f64,

    /// Magnitudes below this value are clamped before the logarithm
    #[serde(default = "default_magnitude_floor")]
    pub magnitude_floor: f64,
}

fn default_sampling_rate() -> f64 {
    1000.0
}

fn default_magnitude_floor() -> f64 {
    1e-12
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sampling_rate_hz: default_sampling_rate(),
            magnitude_floor: default_magnitude_floor(),
        }
    }
}

/// Fixed layout of a pcal file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Exact number of data rows a file must contain
    #[serde(default = "default_expected_rows")]
    pub expected_rows: usize,

    /// Length of each contiguous segment, in file order
    #[serde(default = "default_segment_lengths")]
    pub segment_lengths: Vec<usize>,
}

fn default_expected_rows() -> usize {
    16388
}

fn default_segment_lengths() -> Vec<usize> {
    vec![4097, 4097, 4097, 4096]
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            expected_rows: default_expected_rows(),
            segment_lengths: default_segment_lengths(),
        }
    }
}

/// Main pipeline configuration combining all sub-configs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub input: InputConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub spectrum: SpectrumConfig,

    #[serde(default)]
    pub layout: LayoutConfig,
}

impl PipelineConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the invariants the pipeline relies on.
    ///
    /// The segment layout must fit inside the expected row count, otherwise
    /// splitting a validated file could run past its end.
    pub fn validate(&self) -> Result<()> {
        let spectrum = &self.spectrum;
        if !(spectrum.sampling_rate_hz.is_finite() && spectrum.sampling_rate_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "sampling_rate_hz must be positive, got {}",
                spectrum.sampling_rate_hz
            )));
        }
        if !(spectrum.magnitude_floor.is_finite() && spectrum.magnitude_floor > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "magnitude_floor must be positive, got {}",
                spectrum.magnitude_floor
            )));
        }

        let layout = &self.layout;
        if layout.segment_lengths.is_empty() {
            return Err(ConfigError::Invalid("segment_lengths is empty".to_string()));
        }
        if layout.segment_lengths.contains(&0) {
            return Err(ConfigError::Invalid(
                "segment_lengths contains a zero-length segment".to_string(),
            ));
        }
        let total = layout
            .segment_lengths
            .iter()
            .try_fold(0usize, |acc, &len| acc.checked_add(len))
            .ok_or_else(|| ConfigError::Invalid("segment_lengths overflow".to_string()))?;
        if total > layout.expected_rows {
            return Err(ConfigError::Invalid(format!(
                "segments need {} rows but files only have {}",
                total, layout.expected_rows
            )));
        }

        if self.output.report_name.trim().is_empty() {
            return Err(ConfigError::Invalid("report_name is empty".to_string()));
        }

        Ok(())
    }

    /// Full path of the HTML report.
    pub fn report_path(&self) -> PathBuf {
        self.output.output_dir.join(&self.output.report_name)
    }
}
