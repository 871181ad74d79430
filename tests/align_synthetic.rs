//! Registration of synthetically warped images against their source

use approx::assert_abs_diff_eq;
use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{Interpolation, Projection, warp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_omr::models::Point;
use rust_omr::{AlignerConfig, ImageAligner};

fn random_blocks(size: u32, seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(size, size, Luma([210]));
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..70 {
        let w = rng.gen_range(10..50);
        let h = rng.gen_range(10..50);
        let x = rng.gen_range(0..size - w);
        let y = rng.gen_range(0..size - h);
        let shade: u8 = rng.gen_range(0..=255);
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Luma([shade]));
            }
        }
    }
    img
}

/// Rotation about the image centre followed by a translation
fn rigid(size: u32, degrees: f32, tx: f32, ty: f32) -> [f32; 9] {
    let (s, c) = degrees.to_radians().sin_cos();
    let half = size as f32 / 2.0;
    [
        c,
        -s,
        half - c * half + s * half + tx,
        s,
        c,
        half - s * half - c * half + ty,
        0.0,
        0.0,
        1.0,
    ]
}

fn apply(m: &[f32; 9], p: Point) -> Point {
    let w = m[6] * p.x + m[7] * p.y + m[8];
    Point::new(
        (m[0] * p.x + m[1] * p.y + m[2]) / w,
        (m[3] * p.x + m[4] * p.y + m[5]) / w,
    )
}

fn mean_abs_diff(a: &GrayImage, b: &GrayImage, margin: u32) -> f64 {
    let (w, h) = a.dimensions();
    let mut sum = 0u64;
    let mut count = 0u64;
    for y in margin..h - margin {
        for x in margin..w - margin {
            sum += (a.get_pixel(x, y).0[0] as i32 - b.get_pixel(x, y).0[0] as i32).unsigned_abs() as u64;
            count += 1;
        }
    }
    sum as f64 / count as f64
}

#[test]
fn recovers_small_rotation_and_shift() {
    let size = 320;
    let reference = random_blocks(size, 11);
    let forward = rigid(size, 3.0, 6.0, -4.0);
    let projection = Projection::from_matrix(forward).unwrap();
    let scan = warp(&reference, &projection, Interpolation::Bilinear, Luma([210]));

    let aligner = ImageAligner::new(&reference, AlignerConfig::default());
    let aligned = aligner.align(&scan).unwrap();
    assert_eq!(aligned.image.dimensions(), (size, size));
    assert!(aligned.inliers >= 8);

    // Reference point -> scan -> back to reference
    for (x, y) in [(80.0, 80.0), (160.0, 160.0), (240.0, 100.0), (100.0, 240.0)] {
        let p = Point::new(x, y);
        let back = aligned.transform.to_reference(&apply(&forward, p));
        assert_abs_diff_eq!(back.x, p.x, epsilon = 1.5);
        assert_abs_diff_eq!(back.y, p.y, epsilon = 1.5);
        assert!(back.distance(&p) < 2.0);
    }

    let before = mean_abs_diff(&reference, &scan, 30);
    let after = mean_abs_diff(&reference, &aligned.image, 30);
    assert!(after < 15.0, "after = {after}");
    assert!(after < before / 2.0, "before = {before}, after = {after}");
}

#[test]
fn identical_images_align_to_identity() {
    let reference = random_blocks(256, 5);
    let aligner = ImageAligner::new(&reference, AlignerConfig::default());
    let aligned = aligner.align(&reference).unwrap();
    let p = Point::new(128.0, 64.0);
    let q = aligned.transform.to_reference(&p);
    assert_abs_diff_eq!(q.x, p.x, epsilon = 0.5);
    assert_abs_diff_eq!(q.y, p.y, epsilon = 0.5);
}

#[test]
fn aligns_file_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let reference = random_blocks(240, 9);
    let shifted = warp(
        &reference,
        &Projection::translate(5.0, 3.0),
        Interpolation::Bilinear,
        Luma([210]),
    );
    let path = dir.path().join("sheetF.png");
    shifted.save(&path).unwrap();

    let aligner = ImageAligner::new(&reference, AlignerConfig::default());
    aligner.align_file(&path).unwrap();

    let rewritten = image::open(&path).unwrap().to_luma8();
    assert_eq!(rewritten.dimensions(), reference.dimensions());
    let before = mean_abs_diff(&reference, &shifted, 20);
    let after = mean_abs_diff(&reference, &rewritten, 20);
    assert!(after < before / 2.0, "before = {before}, after = {after}");
}
