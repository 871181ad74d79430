//! RustOMR - template-based OMR bubble-sheet extraction
//!
//! Reads scanned answer sheets into a table using a reusable geometric
//! template. A scan is first registered against the template's reference
//! image, then every template region is cropped and classified as unmarked,
//! single-marked or ambiguous.
//!
//! ```no_run
//! use std::path::Path;
//! use rust_omr::{BatchScanner, ScanConfig, TemplateStore, export};
//!
//! let template = TemplateStore::load(Path::new("sheet.gs"))?;
//! let questions = template.question_count();
//! let report = BatchScanner::new(template, ScanConfig::from_env()).scan(Path::new("scans"))?;
//! export::save_csv(&report, questions, Path::new("results.csv"))?;
//! # Ok::<(), rust_omr::OmrError>(())
//! ```

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Image registration (features, matching, homography warp)
pub mod align;
/// Directory passes, progress and cancellation
pub mod batch;
/// Run configuration
pub mod config;
/// Region detection (slot partition, connected components)
pub mod detector;
/// Error types
pub mod error;
/// CSV output
pub mod export;
/// Core data structures (Rect, Template, ScanRow, BitMatrix, etc.)
pub mod models;
/// Single-image extraction
pub mod pipeline;
/// Template files
pub mod store;
/// Image loading, directory enumeration and environment helpers
pub mod tools;
/// Utility functions (binarization, blur, geometry)
pub mod utils;

pub use align::{AlignedImage, AlignerConfig, AlignmentTransform, ImageAligner};
pub use batch::{AlignReport, BatchScanner, CancelToken, Progress, Stage, align_directory, progress_channel};
pub use config::ScanConfig;
pub use detector::RegionDetector;
pub use detector::config::{DetectionParams, DetectorConfig, DetectorSet, PartitionSpec};
pub use detector::partition::Axis;
pub use error::{FailureKind, OmrError, Result};
pub use models::{
    DetectionOutcome, IndexedRect, Rect, RegionGroup, ScanFailure, ScanReport, ScanRow, ScanWarning,
    Template, TemplateBuilder,
};
pub use pipeline::{SheetReader, extract_row};
pub use store::TemplateStore;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reexports_compose() {
        let mut builder = Template::builder();
        builder.set_series(Rect::new(0, 0, 10, 40));
        builder.push_roll_digit(Rect::new(10, 0, 10, 100));
        builder.push_question(Rect::new(20, 0, 40, 10));
        let template = builder.build();
        assert!(template.ensure_scannable().is_ok());

        let config = ScanConfig::default();
        assert_eq!(config.detectors.answer.partition.axis, Axis::Horizontal);
    }
}
