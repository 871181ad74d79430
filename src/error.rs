//! Error types for template loading, alignment and extraction.
//!
//! Run-level problems (a malformed template file, a template with nothing to
//! scan) abort before any image is touched. Image-level problems are turned
//! into [`ScanFailure`](crate::models::ScanFailure) records by the batch
//! scanner and never stop a run.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::{Rect, RegionGroup};

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, OmrError>;

/// Classification of a failure, independent of its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The image file is missing, unreadable or not a decodable image.
    ImageLoad,
    /// Writing an image (aligned output) failed.
    ImageSave,
    /// Too few correspondences or a degenerate homography.
    Alignment,
    /// A template region does not fit inside the image.
    RegionOutOfBounds,
    /// The template lacks a region group required for scanning.
    TemplateMissing,
    /// The template file could not be parsed or violates its invariants.
    StorageFormat,
    /// Any other I/O error.
    Io,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::ImageLoad => write!(f, "image load"),
            FailureKind::ImageSave => write!(f, "image save"),
            FailureKind::Alignment => write!(f, "alignment"),
            FailureKind::RegionOutOfBounds => write!(f, "region out of bounds"),
            FailureKind::TemplateMissing => write!(f, "template missing"),
            FailureKind::StorageFormat => write!(f, "storage format"),
            FailureKind::Io => write!(f, "io"),
        }
    }
}

/// Errors produced by the OMR engine.
#[derive(Error, Debug)]
pub enum OmrError {
    /// An image could not be opened or decoded.
    #[error("failed to load image {}", path.display())]
    ImageLoad {
        /// Offending file.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: image::ImageError,
    },

    /// An image could not be encoded or written.
    #[error("failed to save image {}", path.display())]
    ImageSave {
        /// Destination file.
        path: PathBuf,
        /// Encoder error.
        #[source]
        source: image::ImageError,
    },

    /// Registration against the reference image failed.
    #[error("alignment failed: {reason}")]
    Alignment {
        /// Human readable cause.
        reason: String,
    },

    /// A region lies (partly) outside the image it is applied to.
    #[error(
        "{group} region{} {rect:?} exceeds image bounds {width}x{height}",
        index.map(|i| format!(" #{i}")).unwrap_or_default()
    )]
    RegionOutOfBounds {
        /// Region group of the offending rectangle.
        group: RegionGroup,
        /// Index within the group, `None` for the series region.
        index: Option<u32>,
        /// The offending rectangle.
        rect: Rect,
        /// Image width.
        width: u32,
        /// Image height.
        height: u32,
    },

    /// The template cannot be scanned because a required group is empty.
    #[error("template has no {missing} defined")]
    TemplateMissing {
        /// Name of the missing group.
        missing: &'static str,
    },

    /// The template file is malformed.
    #[error("invalid template file: {message}")]
    StorageFormat {
        /// Description of the problem.
        message: String,
    },

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl OmrError {
    /// Creates an alignment error.
    pub fn alignment(reason: impl Into<String>) -> Self {
        Self::Alignment {
            reason: reason.into(),
        }
    }

    /// Creates a storage format error.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageFormat {
            message: message.into(),
        }
    }

    /// Returns the failure classification of this error.
    pub fn kind(&self) -> FailureKind {
        match self {
            OmrError::ImageLoad { .. } => FailureKind::ImageLoad,
            OmrError::ImageSave { .. } => FailureKind::ImageSave,
            OmrError::Alignment { .. } => FailureKind::Alignment,
            OmrError::RegionOutOfBounds { .. } => FailureKind::RegionOutOfBounds,
            OmrError::TemplateMissing { .. } => FailureKind::TemplateMissing,
            OmrError::StorageFormat { .. } => FailureKind::StorageFormat,
            OmrError::Io(_) => FailureKind::Io,
        }
    }
}

impl From<serde_json::Error> for OmrError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(err.to_string())
    }
}
