//! Batch power-spectrum analysis of pcal autocorrelation files.
//!
//! This crate provides tools for:
//! - Loading two-column autocorrelation files and splitting them into segments
//! - DC-offset removal and symmetrization of each segment
//! - Decibel power spectra via an unwindowed FFT
//! - Static PNG plots, interactive spectrum pages and an HTML report
//!
//! # Example
//!
//! ```no_run
//! use pcal_spectrum::core::{load_autocorrelation, split_segments, SpectrumAnalyzer};
//! use pcal_spectrum::core::transforms::prepare_autocorrelation;
//!
//! let data = load_autocorrelation("data/scan.dat", 16388).unwrap();
//! let segments = split_segments(&data.values, &[4097, 4097, 4097, 4096]).unwrap();
//! let mut analyzer = SpectrumAnalyzer::new(1000.0, 1e-12);
//! let spectrum = analyzer.compute(&prepare_autocorrelation(segments[0].samples).values);
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod processors;
pub mod visualization;

pub use config::{InputConfig, LayoutConfig, OutputConfig, PipelineConfig, SpectrumConfig};
pub use crate::core::loaders::AutocorrelationFile;
pub use crate::core::transforms::{PowerSpectrum, SymmetrizedAutocorrelation};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
