use std::path::Path;

use image::{GrayImage, imageops};
use tracing::debug;

use crate::detector::RegionDetector;
use crate::detector::config::DetectorSet;
use crate::error::Result;
use crate::models::{IndexedRect, Rect, ScanRow, Template};

/// The four detectors used to read one sheet, built once per run
#[derive(Debug, Clone)]
pub struct SheetReader {
    answer: RegionDetector,
    roll_number: RegionDetector,
    question_bank: RegionDetector,
    series: RegionDetector,
}

impl SheetReader {
    /// Build detectors from their configurations
    pub fn new(detectors: &DetectorSet) -> Self {
        Self {
            answer: RegionDetector::new(detectors.answer.clone()),
            roll_number: RegionDetector::new(detectors.roll_number.clone()),
            question_bank: RegionDetector::new(detectors.question_bank.clone()),
            series: RegionDetector::new(detectors.series.clone()),
        }
    }

    /// Read every template region of an aligned image into a row
    ///
    /// Fails with `TemplateMissing` for an incomplete template and with
    /// `RegionOutOfBounds` when a region does not fit the image.
    pub fn read(&self, image: &GrayImage, template: &Template, path: &Path) -> Result<ScanRow> {
        let series = template.ensure_scannable()?;
        let (width, height) = image.dimensions();
        template.check_bounds(width, height)?;

        let roll_number = read_group(image, &template.roll_number_regions, &self.roll_number);
        let qbno = read_group(image, &template.qbno_regions, &self.question_bank);
        let answers: Vec<char> = template
            .question_regions
            .iter()
            .map(|r| self.answer.detect(&crop(image, &r.rect)).symbol())
            .collect();
        let qpseries = self.series.detect(&crop(image, &series)).symbol();

        debug!(
            path = %path.display(),
            roll = %roll_number,
            qbno = %qbno,
            series = %qpseries,
            "row extracted"
        );

        Ok(ScanRow {
            roll_number,
            qbno,
            qpseries,
            answers,
            source_image_path: path.to_path_buf(),
        })
    }
}

/// Extract one row from an already loaded, reference-aligned image
pub fn extract_row(
    image: &GrayImage,
    template: &Template,
    detectors: &DetectorSet,
    path: &Path,
) -> Result<ScanRow> {
    SheetReader::new(detectors).read(image, template, path)
}

/// Concatenate the symbols of a group in index order
fn read_group(image: &GrayImage, regions: &[IndexedRect], detector: &RegionDetector) -> String {
    regions
        .iter()
        .map(|r| detector.detect(&crop(image, &r.rect)).symbol())
        .collect()
}

fn crop(image: &GrayImage, rect: &Rect) -> GrayImage {
    imageops::crop_imm(image, rect.x, rect.y, rect.width, rect.height).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use image::Luma;

    fn fill(img: &mut GrayImage, x: u32, y: u32, w: u32, h: u32) {
        for yy in y..y + h {
            for xx in x..x + w {
                img.put_pixel(xx, yy, Luma([0]));
            }
        }
    }

    /// Sheet with series at x=0, two roll columns, one qbno column and two questions
    fn layout() -> Template {
        let mut b = Template::builder();
        b.set_series(Rect::new(0, 0, 30, 120));
        b.push_roll_digit(Rect::new(40, 0, 30, 300));
        b.push_roll_digit(Rect::new(80, 0, 30, 300));
        b.push_qbno_digit(Rect::new(120, 0, 30, 300));
        b.push_question(Rect::new(160, 0, 120, 30));
        b.push_question(Rect::new(160, 40, 120, 30));
        b.build()
    }

    #[test]
    fn test_extract_row() {
        let template = layout();
        let mut img = GrayImage::from_pixel(300, 320, Luma([255]));
        // series 'B': slot 1 of 4 stacked 30px slots
        fill(&mut img, 5, 35, 20, 20);
        // roll digits 3 and 7
        fill(&mut img, 45, 95, 20, 20);
        fill(&mut img, 85, 215, 20, 20);
        // qbno left blank; question 1 'C', question 2 marked twice
        fill(&mut img, 225, 5, 20, 20);
        fill(&mut img, 165, 45, 20, 20);
        fill(&mut img, 255, 45, 20, 20);

        let row = extract_row(&img, &template, &DetectorSet::default(), Path::new("s/1F.jpg"))
            .unwrap();
        assert_eq!(row.qpseries, 'B');
        assert_eq!(row.roll_number, "37");
        assert_eq!(row.qbno, "X");
        assert_eq!(row.answers, vec!['C', '*']);
        assert_eq!(row.source_image_path, Path::new("s/1F.jpg"));
    }

    #[test]
    fn test_region_out_of_bounds() {
        let template = layout();
        let img = GrayImage::from_pixel(200, 320, Luma([255]));
        let err = extract_row(&img, &template, &DetectorSet::default(), Path::new("a.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::RegionOutOfBounds);
    }

    #[test]
    fn test_incomplete_template() {
        let img = GrayImage::from_pixel(10, 10, Luma([255]));
        let err = extract_row(&img, &Template::default(), &DetectorSet::default(), Path::new("a.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::TemplateMissing);
    }

    #[test]
    fn test_missing_series_is_not_read_as_blank() {
        let mut template = layout();
        template.qpseries_region = None;
        let img = GrayImage::from_pixel(300, 320, Luma([255]));
        let err = extract_row(&img, &template, &DetectorSet::default(), Path::new("a.jpg"))
            .unwrap_err();
        assert_eq!(err.kind(), FailureKind::TemplateMissing);
        assert!(err.to_string().contains("series"), "{err}");
    }
}
