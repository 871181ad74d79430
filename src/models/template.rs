use crate::error::{OmrError, Result};
use crate::models::{IndexedRect, Rect, RegionGroup};

/// Geometric layout of one bubble-sheet design
///
/// All coordinates are in the reference image frame. A template is built once
/// (interactively or via [`TemplateStore`](crate::store::TemplateStore)) and is
/// read-only for the duration of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Template {
    /// Question paper series bubbles (A-D stacked vertically)
    pub qpseries_region: Option<Rect>,
    /// One column per roll-number digit, in index order
    pub roll_number_regions: Vec<IndexedRect>,
    /// One column per question-bank digit, in index order
    pub qbno_regions: Vec<IndexedRect>,
    /// One row of A-D options per question, in index order
    pub question_regions: Vec<IndexedRect>,
}

impl Template {
    /// Start building a template region by region
    pub fn builder() -> TemplateBuilder {
        TemplateBuilder::default()
    }

    /// Number of answer columns the output table will have
    pub fn question_count(&self) -> usize {
        self.question_regions.len()
    }

    /// Fail with `TemplateMissing` unless the template can produce a row
    ///
    /// Returns the series region on success.
    pub fn ensure_scannable(&self) -> Result<Rect> {
        let Some(series) = self.qpseries_region else {
            return Err(OmrError::TemplateMissing {
                missing: "series region",
            });
        };
        if self.roll_number_regions.is_empty() {
            return Err(OmrError::TemplateMissing {
                missing: "roll number regions",
            });
        }
        if self.question_regions.is_empty() {
            return Err(OmrError::TemplateMissing {
                missing: "question regions",
            });
        }
        Ok(series)
    }

    /// Check every region against image dimensions
    ///
    /// Reports the first region that does not fit.
    pub fn check_bounds(&self, width: u32, height: u32) -> Result<()> {
        if let Some(rect) = self.qpseries_region {
            if !rect.fits_within(width, height) {
                return Err(OmrError::RegionOutOfBounds {
                    group: RegionGroup::Series,
                    index: None,
                    rect,
                    width,
                    height,
                });
            }
        }

        for (group, regions) in self.groups() {
            if let Some(bad) = regions.iter().find(|r| !r.rect.fits_within(width, height)) {
                return Err(OmrError::RegionOutOfBounds {
                    group,
                    index: Some(bad.index),
                    rect: bad.rect,
                    width,
                    height,
                });
            }
        }

        Ok(())
    }

    /// Verify the index invariant of every group: 1..=n in stored order
    pub fn check_indices(&self) -> Result<()> {
        for (group, regions) in self.groups() {
            for (pos, region) in regions.iter().enumerate() {
                let expected = pos as u32 + 1;
                if region.index != expected {
                    return Err(OmrError::storage(format!(
                        "{group} regions must be numbered 1..={} in order; found index {} at position {}",
                        regions.len(),
                        region.index,
                        expected
                    )));
                }
                if !region.rect.is_valid() {
                    return Err(OmrError::storage(format!(
                        "{group} region #{} has zero size",
                        region.index
                    )));
                }
            }
        }
        Ok(())
    }

    fn groups(&self) -> [(RegionGroup, &[IndexedRect]); 3] {
        [
            (RegionGroup::RollNumber, &self.roll_number_regions),
            (RegionGroup::QuestionBank, &self.qbno_regions),
            (RegionGroup::Question, &self.question_regions),
        ]
    }
}

/// Explicit capture session replacing per-group counters
///
/// Indices are assigned automatically per group, starting at 1.
#[derive(Debug, Clone, Default)]
pub struct TemplateBuilder {
    template: Template,
    max_roll_digits: Option<usize>,
    max_qbno_digits: Option<usize>,
}

impl TemplateBuilder {
    /// Limit the number of roll-number digit columns
    pub fn with_max_roll_digits(mut self, max: usize) -> Self {
        self.max_roll_digits = Some(max);
        self
    }

    /// Limit the number of question-bank digit columns
    pub fn with_max_qbno_digits(mut self, max: usize) -> Self {
        self.max_qbno_digits = Some(max);
        self
    }

    /// Set (or replace) the series region
    pub fn set_series(&mut self, rect: Rect) -> &mut Self {
        self.template.qpseries_region = Some(rect);
        self
    }

    /// Append a roll-number digit column; `None` once the limit is reached
    pub fn push_roll_digit(&mut self, rect: Rect) -> Option<u32> {
        push_limited(
            &mut self.template.roll_number_regions,
            rect,
            self.max_roll_digits,
        )
    }

    /// Append a question-bank digit column; `None` once the limit is reached
    pub fn push_qbno_digit(&mut self, rect: Rect) -> Option<u32> {
        push_limited(&mut self.template.qbno_regions, rect, self.max_qbno_digits)
    }

    /// Append the next question row and return its number
    pub fn push_question(&mut self, rect: Rect) -> u32 {
        let index = self.template.question_regions.len() as u32 + 1;
        self.template
            .question_regions
            .push(IndexedRect::new(index, rect));
        index
    }

    /// Finish the session
    pub fn build(self) -> Template {
        self.template
    }
}

fn push_limited(group: &mut Vec<IndexedRect>, rect: Rect, limit: Option<usize>) -> Option<u32> {
    if limit.is_some_and(|max| group.len() >= max) {
        return None;
    }
    let index = group.len() as u32 + 1;
    group.push(IndexedRect::new(index, rect));
    Some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn sample() -> Template {
        let mut b = Template::builder().with_max_roll_digits(2);
        b.set_series(Rect::new(0, 0, 10, 40));
        b.push_roll_digit(Rect::new(20, 0, 10, 100));
        b.push_roll_digit(Rect::new(30, 0, 10, 100));
        b.push_question(Rect::new(50, 0, 40, 10));
        b.build()
    }

    #[test]
    fn test_builder_assigns_indices_and_limits() {
        let mut b = Template::builder().with_max_qbno_digits(1);
        assert_eq!(b.push_qbno_digit(Rect::new(0, 0, 5, 5)), Some(1));
        assert_eq!(b.push_qbno_digit(Rect::new(5, 0, 5, 5)), None);
        assert_eq!(b.push_question(Rect::new(0, 0, 5, 5)), 1);
        assert_eq!(b.push_question(Rect::new(0, 5, 5, 5)), 2);
        let t = b.build();
        assert_eq!(t.qbno_regions.len(), 1);
        assert_eq!(t.question_count(), 2);
        assert!(t.check_indices().is_ok());
    }

    #[test]
    fn test_ensure_scannable() {
        assert_eq!(sample().ensure_scannable().unwrap(), Rect::new(0, 0, 10, 40));

        let mut t = sample();
        t.qpseries_region = None;
        let err = t.ensure_scannable().unwrap_err();
        assert_eq!(err.kind(), FailureKind::TemplateMissing);

        let mut t = sample();
        t.question_regions.clear();
        assert!(t.ensure_scannable().is_err());
    }

    #[test]
    fn test_check_bounds_reports_offender() {
        let t = sample();
        assert!(t.check_bounds(100, 100).is_ok());
        match t.check_bounds(100, 99) {
            Err(OmrError::RegionOutOfBounds { group, index, .. }) => {
                assert_eq!(group, RegionGroup::RollNumber);
                assert_eq!(index, Some(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
        match t.check_bounds(85, 100) {
            Err(OmrError::RegionOutOfBounds { group, index, .. }) => {
                assert_eq!(group, RegionGroup::Question);
                assert_eq!(index, Some(1));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_check_indices_rejects_gaps() {
        let mut t = sample();
        t.roll_number_regions[1].index = 3;
        assert_eq!(t.check_indices().unwrap_err().kind(), FailureKind::StorageFormat);
    }
}
