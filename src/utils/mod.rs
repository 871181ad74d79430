//! Utility functions for image processing
//!
//! This module provides helper functions for region detection and alignment:
//! - Binarization (inverted global threshold)
//! - Gaussian smoothing with an explicit kernel size
//! - Geometry (homography estimation, RANSAC)

pub mod binarization;
pub mod blur;
pub mod geometry;
