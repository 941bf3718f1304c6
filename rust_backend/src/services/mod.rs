//! Service layer for report orchestration.
//!
//! Services sit between the loaders and the renderer: they run the builder,
//! the aggregation engine and the rollups in order and package the result.

pub mod report;

pub use report::{
    build_report, build_report_from_files, compute_report, load_records_file, ProgressReport,
    ResourceProgress,
};
