//! Batch processing: discovery, the per-file pipeline and the report.

pub mod filtering;
pub mod pipeline;
pub mod report;

// Re-export key types for convenience
pub use filtering::{find_input_files, load_exclusion_list, partition_excluded, FilteringError};
pub use pipeline::{
    process_batch, process_file, run_pipeline, BatchOutcome, BatchWarning, FileReport,
    PipelineError, RunSummary, SegmentArtifacts,
};
pub use report::ReportBuilder;
