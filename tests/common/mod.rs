//! Synthetic bubble sheets for integration tests.
#![allow(dead_code)]

use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_omr::{Rect, Template};

pub const SHEET_WIDTH: u32 = 400;
pub const SHEET_HEIGHT: u32 = 500;
const SLOT: u32 = 30;

/// Marks to draw on a sheet; `None` leaves a region blank
#[derive(Debug, Clone)]
pub struct Marks {
    pub series: Option<usize>,
    pub roll: Vec<Vec<usize>>,
    pub qbno: Vec<Vec<usize>>,
    pub answers: Vec<Vec<usize>>,
}

/// Layout used by every test sheet: 2 roll digits, 1 qbno digit, 3 questions
pub fn sheet_template() -> Template {
    let mut b = Template::builder().with_max_roll_digits(2);
    b.set_series(Rect::new(20, 100, SLOT, 4 * SLOT));
    b.push_roll_digit(Rect::new(70, 100, SLOT, 10 * SLOT));
    b.push_roll_digit(Rect::new(110, 100, SLOT, 10 * SLOT));
    b.push_qbno_digit(Rect::new(150, 100, SLOT, 10 * SLOT));
    for q in 0..3 {
        b.push_question(Rect::new(200, 100 + q * 40, 4 * SLOT, SLOT));
    }
    b.build()
}

/// White sheet with random grey blocks outside every template region
pub fn textured_sheet(seed: u64) -> GrayImage {
    let mut img = GrayImage::from_pixel(SHEET_WIDTH, SHEET_HEIGHT, Luma([255]));
    let mut rng = StdRng::seed_from_u64(seed);
    // Bands: top, bottom and right edge
    let bands = [(0, 0, 400, 80), (0, 420, 400, 80), (330, 80, 70, 340)];
    for &(bx, by, bw, bh) in &bands {
        for _ in 0..25 {
            let w = rng.gen_range(8..30u32).min(bw);
            let h = rng.gen_range(8..30u32).min(bh);
            let x = bx + rng.gen_range(0..=bw - w);
            let y = by + rng.gen_range(0..=bh - h);
            let shade = rng.gen_range(0..180u8);
            fill(&mut img, x, y, w, h, shade);
        }
    }
    img
}

/// Draw `marks` onto a copy of `base`
pub fn marked_sheet(base: &GrayImage, marks: &Marks) -> GrayImage {
    let template = sheet_template();
    let mut img = base.clone();
    let mut bubble = |rect: Rect, slot: usize, vertical: bool| {
        let (x, y) = if vertical {
            (rect.x, rect.y + slot as u32 * SLOT)
        } else {
            (rect.x + slot as u32 * SLOT, rect.y)
        };
        fill(&mut img, x + 5, y + 5, SLOT - 10, SLOT - 10, 0);
    };

    if let (Some(series), Some(rect)) = (marks.series, template.qpseries_region) {
        bubble(rect, series, true);
    }
    for (region, slots) in template.roll_number_regions.iter().zip(&marks.roll) {
        for &s in slots {
            bubble(region.rect, s, true);
        }
    }
    for (region, slots) in template.qbno_regions.iter().zip(&marks.qbno) {
        for &s in slots {
            bubble(region.rect, s, true);
        }
    }
    for (region, slots) in template.question_regions.iter().zip(&marks.answers) {
        for &s in slots {
            bubble(region.rect, s, false);
        }
    }
    img
}

pub fn fill(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32, shade: u8) {
    for yy in y..(y + h).min(img.height()) {
        for xx in x..(x + w).min(img.width()) {
            img.put_pixel(xx, yy, Luma([shade]));
        }
    }
}
