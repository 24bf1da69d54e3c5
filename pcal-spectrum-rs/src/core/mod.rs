//! Core data types, numeric transforms and I/O operations.

pub mod loaders;
pub mod segments;
pub mod transforms;
pub mod writers;

pub use loaders::{load_autocorrelation, AutocorrelationFile, LoaderError};
pub use segments::{split_segments, Segment};
pub use transforms::{PowerSpectrum, SpectrumAnalyzer, SymmetrizedAutocorrelation};
pub use writers::{write_autocorrelation_data, write_spectrum_data, WriteError};
