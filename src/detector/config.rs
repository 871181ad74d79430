//! Detector configurations.
//!
//! The four region kinds of a sheet share one detection algorithm and only
//! differ in the values held here.

use serde::{Deserialize, Serialize};

use super::partition::Axis;

/// How a block is split and what each slot means
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSpec {
    /// Split direction
    pub axis: Axis,
    /// One label per slot; the slot count is `labels.len()`
    pub labels: Vec<char>,
}

impl PartitionSpec {
    /// Number of slots
    pub fn slot_count(&self) -> usize {
        self.labels.len()
    }
}

/// Pixel-level parameters of the detector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Odd Gaussian kernel size, `None` to skip smoothing
    pub blur_kernel: Option<u32>,
    /// Pixels at or below this value count as ink
    pub binary_threshold: u8,
    /// Smallest connected ink area that marks a slot as filled
    pub min_filled_area: u32,
}

/// Complete configuration of a [`RegionDetector`](super::RegionDetector)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Slot layout
    pub partition: PartitionSpec,
    /// Thresholds
    pub params: DetectionParams,
}

const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];
const DIGIT_LABELS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

impl DetectorConfig {
    /// One question row: options A-D side by side
    pub fn answer_option() -> Self {
        Self {
            partition: PartitionSpec {
                axis: Axis::Horizontal,
                labels: OPTION_LABELS.to_vec(),
            },
            params: DetectionParams {
                blur_kernel: Some(5),
                binary_threshold: 100,
                min_filled_area: 80,
            },
        }
    }

    /// One roll-number column: digits 0-9 top to bottom
    pub fn roll_number_digit() -> Self {
        Self {
            partition: PartitionSpec {
                axis: Axis::Vertical,
                labels: DIGIT_LABELS.to_vec(),
            },
            params: DetectionParams {
                blur_kernel: Some(5),
                binary_threshold: 100,
                min_filled_area: 100,
            },
        }
    }

    /// One question-bank column: digits 0-9 top to bottom, unsmoothed
    pub fn question_bank_digit() -> Self {
        Self {
            partition: PartitionSpec {
                axis: Axis::Vertical,
                labels: DIGIT_LABELS.to_vec(),
            },
            params: DetectionParams {
                blur_kernel: None,
                binary_threshold: 25,
                min_filled_area: 0,
            },
        }
    }

    /// Series code: options A-D top to bottom, unsmoothed
    pub fn series_code() -> Self {
        Self {
            partition: PartitionSpec {
                axis: Axis::Vertical,
                labels: OPTION_LABELS.to_vec(),
            },
            params: DetectionParams {
                blur_kernel: None,
                binary_threshold: 50,
                min_filled_area: 0,
            },
        }
    }

    /// Any ink component, however small, marks a slot
    pub fn is_noise_sensitive(&self) -> bool {
        self.params.min_filled_area == 0
    }
}

/// The four configurations used to read one sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorSet {
    /// Question rows
    pub answer: DetectorConfig,
    /// Roll-number columns
    pub roll_number: DetectorConfig,
    /// Question-bank columns
    pub question_bank: DetectorConfig,
    /// Series region
    pub series: DetectorConfig,
}

impl DetectorSet {
    /// Names of configurations that accept arbitrarily small components
    pub fn noise_sensitive(&self) -> Vec<&'static str> {
        [
            ("answer", &self.answer),
            ("roll number", &self.roll_number),
            ("question bank", &self.question_bank),
            ("series", &self.series),
        ]
        .into_iter()
        .filter(|(_, c)| c.is_noise_sensitive())
        .map(|(name, _)| name)
        .collect()
    }
}

impl Default for DetectorSet {
    fn default() -> Self {
        Self {
            answer: DetectorConfig::answer_option(),
            roll_number: DetectorConfig::roll_number_digit(),
            question_bank: DetectorConfig::question_bank_digit(),
            series: DetectorConfig::series_code(),
        }
    }
}
