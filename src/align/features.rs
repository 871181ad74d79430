//! Oriented FAST keypoints with rotated binary descriptors.
//!
//! Keypoints are detected on an image pyramid so that moderate scale changes
//! still match; each keypoint gets an orientation from its intensity centroid
//! and a 256-bit descriptor sampled along a fixed, rotated test pattern.

use image::imageops::{self, FilterType};
use image::GrayImage;
use imageproc::corners::corners_fast9;
use imageproc::filter::gaussian_blur_f32;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::models::Point;

/// Radius of the orientation window and of the descriptor patch
const PATCH_RADIUS: i32 = 15;
/// Test pattern points stay inside this radius so rotation never leaves the patch
const PATTERN_RADIUS: i32 = 13;
/// Keypoints closer than this to a border are discarded
const EDGE: u32 = PATCH_RADIUS as u32 + 1;
/// Number of intensity comparisons per descriptor
const DESCRIPTOR_BITS: usize = 256;
const PATTERN_SEED: u64 = 0x0b5e_55ed;
/// Sigma of the smoothing applied before descriptor sampling
const DESCRIPTOR_SIGMA: f32 = 2.0;

/// 256-bit binary descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Descriptor(pub [u64; 4]);

impl Descriptor {
    /// Number of differing bits
    pub fn hamming(&self, other: &Descriptor) -> u32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a ^ b).count_ones())
            .sum()
    }

    fn set_bit(&mut self, bit: usize) {
        self.0[bit / 64] |= 1u64 << (bit % 64);
    }
}

/// Detected keypoint, expressed in full-resolution coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    /// Position in the input image
    pub point: Point,
    /// Pyramid level it was found on
    pub level: usize,
    /// Orientation in radians
    pub angle: f32,
    /// FAST corner score
    pub score: f32,
}

/// Keypoints and their descriptors, index-aligned
#[derive(Debug, Clone, Default)]
pub struct FeatureSet {
    /// Keypoints
    pub keypoints: Vec<Keypoint>,
    /// Descriptor of `keypoints[i]`
    pub descriptors: Vec<Descriptor>,
}

impl FeatureSet {
    /// Number of features
    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    /// No features were found
    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }
}

/// Feature detection parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureConfig {
    /// Upper bound on features over all pyramid levels
    pub max_features: usize,
    /// Number of pyramid levels
    pub levels: usize,
    /// Downscale factor between consecutive levels (> 1)
    pub scale_factor: f32,
    /// FAST intensity threshold
    pub fast_threshold: u8,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            max_features: 10_000,
            levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
        }
    }
}

/// Detects keypoints and computes descriptors with a fixed test pattern
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    config: FeatureConfig,
    pattern: Vec<[(i32, i32); 2]>,
}

impl FeatureExtractor {
    /// Create an extractor; the sampling pattern is identical for every instance
    pub fn new(config: FeatureConfig) -> Self {
        Self {
            config,
            pattern: test_pattern(),
        }
    }

    /// Configuration in use
    pub fn config(&self) -> &FeatureConfig {
        &self.config
    }

    /// Detect and describe features on every pyramid level
    pub fn extract(&self, image: &GrayImage) -> FeatureSet {
        let mut features = FeatureSet::default();
        let levels = self.config.levels.max(1);
        let scale_factor = self.config.scale_factor.max(1.01);
        let quotas = level_quotas(self.config.max_features, levels, scale_factor);

        for (level, &quota) in quotas.iter().enumerate() {
            let scale = scale_factor.powi(level as i32);
            let width = (image.width() as f32 / scale).round() as u32;
            let height = (image.height() as f32 / scale).round() as u32;
            if width <= 2 * EDGE || height <= 2 * EDGE {
                break;
            }
            if quota == 0 {
                continue;
            }

            let level_img = if level == 0 {
                image.clone()
            } else {
                imageops::resize(image, width, height, FilterType::Triangle)
            };
            let smoothed = gaussian_blur_f32(&level_img, DESCRIPTOR_SIGMA);

            for (x, y, score) in strongest_corners(&level_img, self.config.fast_threshold, quota) {
                let angle = intensity_centroid_angle(&level_img, x, y);
                let descriptor = self.describe(&smoothed, x, y, angle);
                features.keypoints.push(Keypoint {
                    // Pixel centres line up across levels
                    point: Point::new(
                        (x as f32 + 0.5) * scale - 0.5,
                        (y as f32 + 0.5) * scale - 0.5,
                    ),
                    level,
                    angle,
                    score,
                });
                features.descriptors.push(descriptor);
            }
        }

        features
    }

    fn describe(&self, smoothed: &GrayImage, x: u32, y: u32, angle: f32) -> Descriptor {
        let (sin, cos) = angle.sin_cos();
        let sample = |(px, py): (i32, i32)| -> u8 {
            let rx = (px as f32 * cos - py as f32 * sin).round() as i32;
            let ry = (px as f32 * sin + py as f32 * cos).round() as i32;
            smoothed.get_pixel((x as i32 + rx) as u32, (y as i32 + ry) as u32).0[0]
        };

        let mut descriptor = Descriptor::default();
        for (bit, [a, b]) in self.pattern.iter().enumerate() {
            if sample(*a) < sample(*b) {
                descriptor.set_bit(bit);
            }
        }
        descriptor
    }
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(FeatureConfig::default())
    }
}

/// Split `total` features over the levels geometrically, finer levels first
fn level_quotas(total: usize, levels: usize, scale_factor: f32) -> Vec<usize> {
    let factor = 1.0 / scale_factor;
    let first = total as f32 * (1.0 - factor) / (1.0 - factor.powi(levels as i32));
    let mut quotas: Vec<usize> = (0..levels)
        .map(|i| (first * factor.powi(i as i32)).round() as usize)
        .collect();
    let assigned: usize = quotas[..levels - 1].iter().sum();
    quotas[levels - 1] = total.saturating_sub(assigned);
    quotas
}

/// FAST corners away from the border, locally maximal, strongest first
fn strongest_corners(img: &GrayImage, threshold: u8, limit: usize) -> Vec<(u32, u32, f32)> {
    let (width, height) = img.dimensions();
    let corners: Vec<_> = corners_fast9(img, threshold)
        .into_iter()
        .filter(|c| c.x >= EDGE && c.y >= EDGE && c.x < width - EDGE && c.y < height - EDGE)
        .collect();

    let mut scores = vec![0.0f32; (width * height) as usize];
    for c in &corners {
        scores[(c.y * width + c.x) as usize] = c.score;
    }

    // 3x3 non-maximum suppression; ties keep the first in raster order
    let mut kept: Vec<(u32, u32, f32)> = corners
        .iter()
        .filter(|c| {
            let idx = |x: u32, y: u32| (y * width + x) as usize;
            for dy in -1i32..=1 {
                for dx in -1i32..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = (c.x as i32 + dx) as u32;
                    let ny = (c.y as i32 + dy) as u32;
                    let other = scores[idx(nx, ny)];
                    let before = dy < 0 || (dy == 0 && dx < 0);
                    if other > c.score || (before && other == c.score) {
                        return false;
                    }
                }
            }
            true
        })
        .map(|c| (c.x, c.y, c.score))
        .collect();

    kept.sort_by(|a, b| {
        b.2.partial_cmp(&a.2)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then((a.1, a.0).cmp(&(b.1, b.0)))
    });
    kept.truncate(limit);
    kept
}

/// Orientation from the intensity centroid of the circular patch
fn intensity_centroid_angle(img: &GrayImage, x: u32, y: u32) -> f32 {
    let mut m01 = 0.0f64;
    let mut m10 = 0.0f64;
    for dy in -PATCH_RADIUS..=PATCH_RADIUS {
        for dx in -PATCH_RADIUS..=PATCH_RADIUS {
            if dx * dx + dy * dy > PATCH_RADIUS * PATCH_RADIUS {
                continue;
            }
            let value = img.get_pixel((x as i32 + dx) as u32, (y as i32 + dy) as u32).0[0] as f64;
            m10 += dx as f64 * value;
            m01 += dy as f64 * value;
        }
    }
    m01.atan2(m10) as f32
}

/// Fixed pseudo-random pairs of offsets inside the pattern disc
fn test_pattern() -> Vec<[(i32, i32); 2]> {
    let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
    let mut point = || loop {
        let x = rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        let y = rng.gen_range(-PATTERN_RADIUS..=PATTERN_RADIUS);
        if x * x + y * y <= PATTERN_RADIUS * PATTERN_RADIUS {
            return (x, y);
        }
    };

    let mut pattern = Vec::with_capacity(DESCRIPTOR_BITS);
    while pattern.len() < DESCRIPTOR_BITS {
        let a = point();
        let b = point();
        if a != b {
            pattern.push([a, b]);
        }
    }
    pattern
}
