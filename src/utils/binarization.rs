use image::GrayImage;

use crate::models::BitMatrix;

/// Inverted global threshold: pixels at or below `threshold` become foreground
///
/// Dark ink (a filled bubble) maps to `true`, paper to `false`.
pub fn threshold_binarize_inv(gray: &GrayImage, threshold: u8) -> BitMatrix {
    let (width, height) = gray.dimensions();
    let raw = gray.as_raw();
    let width = width as usize;

    BitMatrix::from_fn(width, height as usize, |x, y| raw[y * width + x] <= threshold)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize_inv() {
        let gray = GrayImage::from_raw(2, 2, vec![100, 150, 200, 50]).unwrap();
        let binary = threshold_binarize_inv(&gray, 100);

        // Pixels <= 100 are ink
        assert!(binary.get(0, 0)); // 100
        assert!(!binary.get(1, 0)); // 150
        assert!(!binary.get(0, 1)); // 200
        assert!(binary.get(1, 1)); // 50
    }

    #[test]
    fn test_threshold_zero_only_black() {
        let gray = GrayImage::from_raw(3, 1, vec![0, 1, 255]).unwrap();
        let binary = threshold_binarize_inv(&gray, 0);
        assert_eq!(binary.count_ones(), 1);
    }
}
