//! Region detection modules
//!
//! This module contains the logic for reading one region of a sheet:
//! - Slot partitioning (equal split along one axis)
//! - Connected component measurement of binarized ink
//! - The configurable region detector used for answers, digits and series

/// Per-use detector configurations and presets
pub mod config;
/// Connected component areas via union-find
pub mod connected_components;
/// Equal, exhaustive slot partitioning
pub mod partition;

use image::GrayImage;

use crate::models::DetectionOutcome;
use crate::utils::binarization::threshold_binarize_inv;
use crate::utils::blur::gaussian_blur;
use config::DetectorConfig;
use connected_components::component_areas;
use partition::slot_bounds;

/// Classifies a cropped grayscale block as unmarked, single or ambiguous
#[derive(Debug, Clone)]
pub struct RegionDetector {
    config: DetectorConfig,
}

impl RegionDetector {
    /// Create a detector for the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Indices of the slots considered filled, in slot order
    pub fn filled_slots(&self, block: &GrayImage) -> Vec<usize> {
        let (width, height) = block.dimensions();
        if width == 0 || height == 0 {
            return Vec::new();
        }
        let params = &self.config.params;

        // Step 1: Optional smoothing against scan noise
        let smoothed;
        let source = match params.blur_kernel {
            Some(kernel) if kernel >= 3 => {
                smoothed = gaussian_blur(block, kernel);
                &smoothed
            }
            _ => block,
        };

        // Step 2: Dark ink becomes foreground
        let binary = threshold_binarize_inv(source, params.binary_threshold);

        // Step 3: Measure ink strictly inside every slot
        let min_area = params.min_filled_area.max(1) as usize;
        slot_bounds(
            width as usize,
            height as usize,
            self.config.partition.axis,
            self.config.partition.slot_count(),
        )
        .iter()
        .enumerate()
        .filter(|(_, slot)| {
            let inside = binary.masked_to(slot.x0, slot.y0, slot.x1, slot.y1);
            component_areas(&inside)
                .first()
                .is_some_and(|&largest| largest >= min_area)
        })
        .map(|(i, _)| i)
        .collect()
    }

    /// Classify the block
    pub fn detect(&self, block: &GrayImage) -> DetectionOutcome {
        let labels = &self.config.partition.labels;
        let filled: Vec<char> = self
            .filled_slots(block)
            .into_iter()
            .filter_map(|i| labels.get(i).copied())
            .collect();
        DetectionOutcome::from_filled(&filled)
    }
}

#[cfg(test)]
mod tests {
    use super::config::DetectorSet;
    use super::partition::{Axis, slot_bounds};
    use super::*;
    use image::Luma;

    /// White block with a solid black disc-ish square centred in each listed slot
    fn block_with_marks(config: &DetectorConfig, width: u32, height: u32, marked: &[usize]) -> GrayImage {
        let mut img = GrayImage::from_pixel(width, height, Luma([255]));
        let slots = slot_bounds(
            width as usize,
            height as usize,
            config.partition.axis,
            config.partition.slot_count(),
        );
        for &i in marked {
            let s = slots[i];
            let (cx, cy) = ((s.x0 + s.x1) / 2, (s.y0 + s.y1) / 2);
            let half_w = (s.x1 - s.x0) / 3;
            let half_h = (s.y1 - s.y0) / 3;
            for y in cy - half_h..=cy + half_h {
                for x in cx - half_w..=cx + half_w {
                    img.put_pixel(x as u32, y as u32, Luma([0]));
                }
            }
        }
        img
    }

    fn geometry(config: &DetectorConfig) -> (u32, u32) {
        match config.partition.axis {
            Axis::Horizontal => (30 * config.partition.slot_count() as u32, 30),
            Axis::Vertical => (30, 30 * config.partition.slot_count() as u32),
        }
    }

    fn all_configs() -> Vec<DetectorConfig> {
        let set = DetectorSet::default();
        vec![set.answer, set.roll_number, set.question_bank, set.series]
    }

    #[test]
    fn test_single_mark_every_config() {
        for config in all_configs() {
            let detector = RegionDetector::new(config.clone());
            let (w, h) = geometry(&config);
            for slot in 0..config.partition.slot_count() {
                let block = block_with_marks(&config, w, h, &[slot]);
                assert_eq!(
                    detector.detect(&block),
                    DetectionOutcome::Single(config.partition.labels[slot]),
                    "config {:?} slot {}",
                    config.partition,
                    slot
                );
            }
        }
    }

    #[test]
    fn test_unmarked_every_config() {
        for config in all_configs() {
            let detector = RegionDetector::new(config.clone());
            let (w, h) = geometry(&config);
            let block = block_with_marks(&config, w, h, &[]);
            assert_eq!(detector.detect(&block), DetectionOutcome::Unmarked);
        }
    }

    #[test]
    fn test_two_marks_ambiguous() {
        for config in all_configs() {
            let detector = RegionDetector::new(config.clone());
            let (w, h) = geometry(&config);
            let block = block_with_marks(&config, w, h, &[0, 2]);
            assert_eq!(detector.detect(&block), DetectionOutcome::Ambiguous);
        }
    }

    #[test]
    fn test_small_speck_ignored_with_min_area() {
        let config = DetectorConfig::answer_option();
        let detector = RegionDetector::new(config);
        let mut block = GrayImage::from_pixel(120, 30, Luma([255]));
        // 3x3 speck in slot B, far below the area threshold
        for y in 14..17 {
            for x in 44..47 {
                block.put_pixel(x, y, Luma([0]));
            }
        }
        assert_eq!(detector.detect(&block), DetectionOutcome::Unmarked);
    }

    #[test]
    fn test_speck_counts_without_min_area() {
        let detector = RegionDetector::new(DetectorConfig::series_code());
        let mut block = GrayImage::from_pixel(30, 120, Luma([255]));
        block.put_pixel(15, 75, Luma([10]));
        assert_eq!(detector.detect(&block), DetectionOutcome::Single('C'));
    }

    #[test]
    fn test_empty_block() {
        let detector = RegionDetector::new(DetectorConfig::answer_option());
        assert_eq!(detector.detect(&GrayImage::new(0, 0)), DetectionOutcome::Unmarked);
    }
}
