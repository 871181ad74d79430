/// Gaussian smoothing with an explicit odd kernel size
use image::GrayImage;
use imageproc::filter::separable_filter_equal;

/// Sigma used for a kernel of `size` taps when none is given.
///
/// Same rule as the common `0.3 * ((k - 1) / 2 - 1) + 0.8` convention so a
/// 5x5 kernel gets sigma 1.1.
pub fn sigma_for_kernel(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1D Gaussian kernel of odd length `size`
pub fn gaussian_kernel(size: u32) -> Vec<f32> {
    let size = size.max(1) | 1;
    let sigma = sigma_for_kernel(size);
    let half = (size / 2) as i32;
    let weights: Vec<f32> = (-half..=half)
        .map(|i| (-(i * i) as f32 / (2.0 * sigma * sigma)).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

/// Blur with a `size` x `size` Gaussian; sizes below 3 return a copy
pub fn gaussian_blur(gray: &GrayImage, size: u32) -> GrayImage {
    if size < 3 {
        return gray.clone();
    }
    let kernel = gaussian_kernel(size);
    separable_filter_equal(gray, &kernel)
}
