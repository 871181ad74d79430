//! Run configuration for directory scans.

use std::thread;

use crate::align::AlignerConfig;
use crate::detector::config::DetectorSet;
use crate::tools::{front_suffix_from_env, match_fraction_from_env, workers_from_env};

/// Default suffix of front-side scans
pub const DEFAULT_FRONT_SUFFIX: &str = "f.jpg";
/// File written into a directory once every scan in it has been aligned
pub const DEFAULT_ALIGNMENT_MARKER: &str = "alignment_done.txt";
/// Content of the alignment marker file
pub const ALIGNMENT_MARKER_CONTENT: &str = "Alignment complete.";

/// Settings shared by the alignment and extraction passes
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Case-insensitive file name suffix of eligible scans
    pub front_suffix: String,
    /// Name of the alignment marker file
    pub alignment_marker: String,
    /// Size of the worker pool
    pub workers: usize,
    /// Detector settings per region kind
    pub detectors: DetectorSet,
    /// Registration settings
    pub aligner: AlignerConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            front_suffix: DEFAULT_FRONT_SUFFIX.to_string(),
            alignment_marker: DEFAULT_ALIGNMENT_MARKER.to_string(),
            workers: default_workers(),
            detectors: DetectorSet::default(),
            aligner: AlignerConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Defaults with `OMR_WORKERS`, `OMR_FRONT_SUFFIX` and `OMR_MATCH_FRACTION` applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(workers) = workers_from_env() {
            config.workers = workers;
        }
        if let Some(suffix) = front_suffix_from_env() {
            config.front_suffix = suffix;
        }
        if let Some(fraction) = match_fraction_from_env() {
            config.aligner.good_match_fraction = fraction;
        }
        config
    }

    /// Override the worker count; `0` is ignored
    pub fn with_workers(mut self, workers: usize) -> Self {
        if workers > 0 {
            self.workers = workers;
        }
        self
    }

    /// Override the front-side suffix
    pub fn with_front_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.front_suffix = suffix.into();
        self
    }
}

fn default_workers() -> usize {
    thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = ScanConfig::default();
        assert_eq!(c.front_suffix, "f.jpg");
        assert_eq!(c.alignment_marker, "alignment_done.txt");
        assert!(c.workers >= 1);
        assert_eq!(c.aligner.good_match_fraction, 0.2);
    }

    #[test]
    fn test_builder_overrides() {
        let c = ScanConfig::default().with_workers(0).with_workers(3).with_front_suffix("_front.png");
        assert_eq!(c.workers, 3);
        assert_eq!(c.front_suffix, "_front.png");
    }

    #[test]
    fn test_from_env_keeps_detector_presets() {
        // Env overrides touch workers, suffix and matching, never detectors
        assert_eq!(ScanConfig::from_env().detectors, ScanConfig::default().detectors);
    }
}
