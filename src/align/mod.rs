//! Image registration against a template reference
//!
//! This module contains the logic for bringing a scanned sheet into the
//! reference pixel grid:
//! - Oriented FAST keypoints with binary descriptors on an image pyramid
//! - Mutual nearest-neighbour Hamming matching
//! - RANSAC homography fit and projective resampling

/// Keypoints and binary descriptors
pub mod features;
/// Descriptor matching
pub mod matching;

use std::fs;
use std::path::{Path, PathBuf};

use image::{GrayImage, ImageFormat, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OmrError, Result};
use crate::models::Point;
use crate::tools::load_gray;
use crate::utils::geometry::{Homography, RansacConfig, fit_homography_ransac};
use features::{FeatureConfig, FeatureExtractor, FeatureSet};
use matching::{cross_check_matches, retain_best};

/// Aligner parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlignerConfig {
    /// Feature budget per image
    pub max_features: usize,
    /// Pyramid depth
    pub pyramid_levels: usize,
    /// Scale ratio between pyramid levels
    pub scale_factor: f32,
    /// FAST threshold
    pub fast_threshold: u8,
    /// Share of the best-ranked matches passed to RANSAC
    pub good_match_fraction: f32,
    /// Lower bound on retained matches, when that many exist
    pub min_retained_matches: usize,
    /// RANSAC inlier distance, pixels
    pub ransac_threshold: f64,
    /// RANSAC hypotheses
    pub ransac_iterations: usize,
    /// Inliers required to accept a homography
    pub min_inliers: usize,
    /// RANSAC seed
    pub seed: u64,
    /// Value written where the warped scan does not cover the reference
    pub border_fill: u8,
}

impl Default for AlignerConfig {
    fn default() -> Self {
        Self {
            max_features: 10_000,
            pyramid_levels: 8,
            scale_factor: 1.2,
            fast_threshold: 20,
            good_match_fraction: 0.2,
            min_retained_matches: 16,
            ransac_threshold: 5.0,
            ransac_iterations: 2000,
            min_inliers: 8,
            seed: 0,
            border_fill: 255,
        }
    }
}

impl AlignerConfig {
    fn feature_config(&self) -> FeatureConfig {
        FeatureConfig {
            max_features: self.max_features,
            levels: self.pyramid_levels,
            scale_factor: self.scale_factor,
            fast_threshold: self.fast_threshold,
        }
    }

    fn ransac_config(&self) -> RansacConfig {
        RansacConfig {
            max_iters: self.ransac_iterations,
            inlier_threshold: self.ransac_threshold,
            min_inliers: self.min_inliers,
            seed: self.seed,
        }
    }
}

/// Projective map from scan coordinates to reference coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentTransform {
    homography: Homography,
}

impl AlignmentTransform {
    /// Wrap a scan-to-reference homography
    pub fn new(homography: Homography) -> Self {
        Self { homography }
    }

    /// Underlying homography
    pub fn homography(&self) -> &Homography {
        &self.homography
    }

    /// Map a scan point into the reference frame
    pub fn to_reference(&self, p: &Point) -> Point {
        self.homography.transform(p)
    }

    /// Resample `scan` into a `width` x `height` reference grid
    pub fn warp(&self, scan: &GrayImage, width: u32, height: u32, fill: u8) -> Result<GrayImage> {
        let m = self.homography.to_row_major();
        let projection = Projection::from_matrix(m.map(|v| v as f32))
            .ok_or_else(|| OmrError::alignment("homography is not invertible"))?;
        let mut out = GrayImage::from_pixel(width, height, Luma([fill]));
        warp_into(scan, &projection, Interpolation::Bilinear, Luma([fill]), &mut out);
        Ok(out)
    }
}

/// Result of aligning one scan
#[derive(Debug, Clone)]
pub struct AlignedImage {
    /// Scan-to-reference transform
    pub transform: AlignmentTransform,
    /// Scan resampled into the reference grid
    pub image: GrayImage,
    /// Matches passed to RANSAC
    pub matches: usize,
    /// RANSAC inliers
    pub inliers: usize,
}

/// Registers scans against one reference image
///
/// Reference features are computed once at construction and reused for
/// every scan, so one aligner can serve a whole batch from many threads.
#[derive(Debug, Clone)]
pub struct ImageAligner {
    config: AlignerConfig,
    extractor: FeatureExtractor,
    reference_size: (u32, u32),
    reference_features: FeatureSet,
}

impl ImageAligner {
    /// Build an aligner around a reference image
    pub fn new(reference: &GrayImage, config: AlignerConfig) -> Self {
        let extractor = FeatureExtractor::new(config.feature_config());
        let reference_features = extractor.extract(reference);
        debug!(
            features = reference_features.len(),
            width = reference.width(),
            height = reference.height(),
            "reference features extracted"
        );
        Self {
            config,
            extractor,
            reference_size: reference.dimensions(),
            reference_features,
        }
    }

    /// Load the reference image from disk
    pub fn from_path(path: &Path, config: AlignerConfig) -> Result<Self> {
        Ok(Self::new(&load_gray(path)?, config))
    }

    /// Configuration in use
    pub fn config(&self) -> &AlignerConfig {
        &self.config
    }

    /// Width and height of the reference grid
    pub fn reference_dimensions(&self) -> (u32, u32) {
        self.reference_size
    }

    /// Estimate the scan-to-reference transform without resampling
    pub fn estimate(&self, scan: &GrayImage) -> Result<(AlignmentTransform, usize, usize)> {
        let scan_features = self.extractor.extract(scan);
        if scan_features.len() < 4 || self.reference_features.len() < 4 {
            return Err(OmrError::alignment(format!(
                "too few keypoints (scan {}, reference {})",
                scan_features.len(),
                self.reference_features.len()
            )));
        }

        let mut matches =
            cross_check_matches(&scan_features.descriptors, &self.reference_features.descriptors);
        retain_best(
            &mut matches,
            self.config.good_match_fraction,
            self.config.min_retained_matches,
        );
        if matches.len() < 4 {
            return Err(OmrError::alignment(format!(
                "only {} usable matches, need at least 4",
                matches.len()
            )));
        }

        let src: Vec<[f64; 2]> = matches
            .iter()
            .map(|m| scan_features.keypoints[m.query].point.to_f64())
            .collect();
        let dst: Vec<[f64; 2]> = matches
            .iter()
            .map(|m| self.reference_features.keypoints[m.train].point.to_f64())
            .collect();

        let fit = fit_homography_ransac(&src, &dst, &self.config.ransac_config())?;
        if fit.homography.is_degenerate() || fit.homography.inverse().is_none() {
            return Err(OmrError::alignment("degenerate homography"));
        }
        debug!(matches = matches.len(), inliers = fit.inliers, "homography estimated");

        Ok((AlignmentTransform::new(fit.homography), matches.len(), fit.inliers))
    }

    /// Estimate the transform and resample the scan into the reference grid
    pub fn align(&self, scan: &GrayImage) -> Result<AlignedImage> {
        let (transform, matches, inliers) = self.estimate(scan)?;
        let (width, height) = self.reference_size;
        let image = transform.warp(scan, width, height, self.config.border_fill)?;
        Ok(AlignedImage {
            transform,
            image,
            matches,
            inliers,
        })
    }

    /// Align the image stored at `path` and replace it with the aligned version
    ///
    /// The result is written to a sibling temporary file in the source
    /// format and renamed over the source, so readers never see a partial file.
    pub fn align_file(&self, path: &Path) -> Result<AlignedImage> {
        let scan = load_gray(path)?;
        let aligned = self.align(&scan)?;
        write_replacing(path, &aligned.image)?;
        Ok(aligned)
    }
}

/// Write `image` over `path` via a temporary sibling and a rename
fn write_replacing(path: &Path, image: &GrayImage) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|source| OmrError::ImageSave {
        path: path.to_path_buf(),
        source,
    })?;
    let tmp = temp_sibling(path);
    if let Err(source) = image.save_with_format(&tmp, format) {
        let _ = fs::remove_file(&tmp);
        return Err(OmrError::ImageSave {
            path: path.to_path_buf(),
            source,
        });
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".aligning");
    path.with_file_name(name)
}
