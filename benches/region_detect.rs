use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{GrayImage, Luma};
use rust_omr::utils::binarization::threshold_binarize_inv;
use rust_omr::{DetectorConfig, RegionDetector};

/// Question row with option C filled
fn answer_row(width: u32, height: u32) -> GrayImage {
    let mut img = GrayImage::from_pixel(width, height, Luma([255]));
    let slot = width / 4;
    for y in height / 4..height * 3 / 4 {
        for x in 2 * slot + slot / 4..3 * slot - slot / 4 {
            img.put_pixel(x, y, Luma([0]));
        }
    }
    img
}

fn bench_answer_row_small(c: &mut Criterion) {
    let block = answer_row(120, 30);
    let detector = RegionDetector::new(DetectorConfig::answer_option());
    c.bench_function("detect_answer_120x30", |b| {
        b.iter(|| detector.detect(black_box(&block)))
    });
}

fn bench_answer_row_large(c: &mut Criterion) {
    let block = answer_row(480, 120);
    let detector = RegionDetector::new(DetectorConfig::answer_option());
    c.bench_function("detect_answer_480x120", |b| {
        b.iter(|| detector.detect(black_box(&block)))
    });
}

fn bench_digit_column(c: &mut Criterion) {
    let block = GrayImage::from_fn(40, 400, |_, y| {
        if (160..190).contains(&y) { Luma([0]) } else { Luma([255]) }
    });
    let detector = RegionDetector::new(DetectorConfig::roll_number_digit());
    c.bench_function("detect_roll_digit_40x400", |b| {
        b.iter(|| detector.detect(black_box(&block)))
    });
}

fn bench_threshold_inv(c: &mut Criterion) {
    let block = answer_row(480, 120);
    c.bench_function("threshold_binarize_inv_480x120", |b| {
        b.iter(|| threshold_binarize_inv(black_box(&block), black_box(100)))
    });
}

criterion_group!(
    benches,
    bench_answer_row_small,
    bench_answer_row_large,
    bench_digit_column,
    bench_threshold_inv
);
criterion_main!(benches);
