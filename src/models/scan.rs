use std::path::{Path, PathBuf};

use crate::error::{FailureKind, OmrError};

/// Fixed leading columns of the output table
pub const LEADING_COLUMNS: [&str; 3] = ["ROLLNO", "QBNO", "QPSERIES"];
/// Trailing image path column of the output table
pub const IMAGE_COLUMN: &str = "Front side Image";

/// Extracted data for one scanned sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanRow {
    /// Roll-number digits (or placeholders) in index order
    pub roll_number: String,
    /// Question-bank number digits (or placeholders) in index order
    pub qbno: String,
    /// Series code, or a placeholder
    pub qpseries: char,
    /// One symbol per question, in index order
    pub answers: Vec<char>,
    /// Image the row was read from
    pub source_image_path: PathBuf,
}

impl ScanRow {
    /// Table cells for this row, matching [`ScanReport::header`]
    pub fn cells(&self) -> Vec<String> {
        let mut cells = Vec::with_capacity(self.answers.len() + 4);
        cells.push(self.roll_number.clone());
        cells.push(self.qbno.clone());
        cells.push(self.qpseries.to_string());
        cells.extend(self.answers.iter().map(char::to_string));
        cells.push(self.source_image_path.display().to_string());
        cells
    }
}

/// One image that could not be turned into a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFailure {
    /// Image path
    pub path: PathBuf,
    /// Failure classification
    pub kind: FailureKind,
    /// Human readable reason
    pub message: String,
}

impl ScanFailure {
    /// Record `err` against `path`
    pub fn from_error(path: &Path, err: &OmrError) -> Self {
        let mut message = err.to_string();
        let mut source = std::error::Error::source(err);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        Self {
            path: path.to_path_buf(),
            kind: err.kind(),
            message,
        }
    }
}

/// Non-fatal condition surfaced to the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanWarning {
    /// The directory has no marker from a completed alignment pass
    AlignmentMarkerMissing {
        /// Expected marker location
        marker: PathBuf,
    },
    /// A detector accepts components of any size and may react to noise
    NoiseSensitiveDetector {
        /// Which detector
        detector: &'static str,
    },
}

/// Result of one batch run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Successful rows, in deterministic path order
    pub rows: Vec<ScanRow>,
    /// Per-image failures, in the same path order
    pub failures: Vec<ScanFailure>,
    /// Non-fatal warnings
    pub warnings: Vec<ScanWarning>,
    /// Number of images a task was started for
    pub attempted: usize,
    /// The run was cancelled before every image was scheduled
    pub cancelled: bool,
}

impl ScanReport {
    /// Table header for `question_count` answer columns
    pub fn header(question_count: usize) -> Vec<String> {
        let mut header: Vec<String> = LEADING_COLUMNS.iter().map(|c| c.to_string()).collect();
        header.extend((1..=question_count).map(|i| format!("A{i}")));
        header.push(IMAGE_COLUMN.to_string());
        header
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_five_questions() {
        assert_eq!(
            ScanReport::header(5).join(","),
            "ROLLNO,QBNO,QPSERIES,A1,A2,A3,A4,A5,Front side Image"
        );
    }

    #[test]
    fn test_row_cells() {
        let row = ScanRow {
            roll_number: "12X4".into(),
            qbno: "7*".into(),
            qpseries: 'B',
            answers: vec!['A', 'X', '*'],
            source_image_path: PathBuf::from("scans/001F.jpg"),
        };
        assert_eq!(
            row.cells(),
            vec!["12X4", "7*", "B", "A", "X", "*", "scans/001F.jpg"]
        );
    }

    #[test]
    fn test_failure_includes_source() {
        let err = OmrError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let failure = ScanFailure::from_error(Path::new("a.jpg"), &err);
        assert_eq!(failure.kind, FailureKind::Io);
        assert_eq!(failure.path, PathBuf::from("a.jpg"));
    }
}
