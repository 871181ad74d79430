//! Template persistence.
//!
//! Templates are stored as JSON (`.gs` by convention) with the layout the
//! template capture tool writes:
//!
//! ```json
//! {
//!   "qpseries_region": [x1, y1, x2, y2],
//!   "question_regions": [[index, x, y, w, h], ...],
//!   "roll_number_regions": [[index, x, y, w, h], ...],
//!   "qbno_regions": [[index, x, y, w, h], ...]
//! }
//! ```
//!
//! The series region is kept in corner form on disk and as a [`Rect`] in
//! memory. Missing groups load as empty; `qpseries_region` may be `null`.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{OmrError, Result};
use crate::models::{IndexedRect, Rect, RegionGroup, Template};

/// On-disk shape of a template file
#[derive(Debug, Default, Serialize, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    qpseries_region: Option<[i64; 4]>,
    #[serde(default)]
    question_regions: Vec<[i64; 5]>,
    #[serde(default)]
    roll_number_regions: Vec<[i64; 5]>,
    #[serde(default)]
    qbno_regions: Vec<[i64; 5]>,
}

/// Reads and writes [`Template`] files
pub struct TemplateStore;

impl TemplateStore {
    /// Write `template` to `path`, replacing any existing file
    pub fn save(template: &Template, path: &Path) -> Result<()> {
        fs::write(path, Self::to_json(template)?)?;
        debug!(path = %path.display(), questions = template.question_count(), "template saved");
        Ok(())
    }

    /// Read and validate a template file
    pub fn load(path: &Path) -> Result<Template> {
        let text = fs::read_to_string(path)?;
        let template = Self::from_json(&text)?;
        debug!(path = %path.display(), questions = template.question_count(), "template loaded");
        Ok(template)
    }

    /// Serialize to the JSON file format
    pub fn to_json(template: &Template) -> Result<String> {
        let file = TemplateFile {
            qpseries_region: template
                .qpseries_region
                .map(|r| r.corners().map(i64::from)),
            question_regions: encode_group(&template.question_regions),
            roll_number_regions: encode_group(&template.roll_number_regions),
            qbno_regions: encode_group(&template.qbno_regions),
        };
        Ok(serde_json::to_string(&file)?)
    }

    /// Parse and validate the JSON file format
    pub fn from_json(text: &str) -> Result<Template> {
        let file: TemplateFile = serde_json::from_str(text)?;

        let qpseries_region = match file.qpseries_region {
            Some([x1, y1, x2, y2]) => {
                let [x1, y1, x2, y2] = [
                    coord(x1, "series x1")?,
                    coord(y1, "series y1")?,
                    coord(x2, "series x2")?,
                    coord(y2, "series y2")?,
                ];
                Some(Rect::from_corners(x1, y1, x2, y2).ok_or_else(|| {
                    OmrError::storage("series region has zero width or height")
                })?)
            }
            None => None,
        };

        let template = Template {
            qpseries_region,
            roll_number_regions: decode_group(RegionGroup::RollNumber, &file.roll_number_regions)?,
            qbno_regions: decode_group(RegionGroup::QuestionBank, &file.qbno_regions)?,
            question_regions: decode_group(RegionGroup::Question, &file.question_regions)?,
        };
        template.check_indices()?;
        Ok(template)
    }
}

fn encode_group(regions: &[IndexedRect]) -> Vec<[i64; 5]> {
    regions
        .iter()
        .map(|r| {
            [
                i64::from(r.index),
                i64::from(r.rect.x),
                i64::from(r.rect.y),
                i64::from(r.rect.width),
                i64::from(r.rect.height),
            ]
        })
        .collect()
}

fn decode_group(group: RegionGroup, entries: &[[i64; 5]]) -> Result<Vec<IndexedRect>> {
    entries
        .iter()
        .map(|&[index, x, y, w, h]| {
            let field = |name: &str| format!("{group} region {name}");
            Ok(IndexedRect::new(
                coord(index, &field("index"))?,
                Rect::new(
                    coord(x, &field("x"))?,
                    coord(y, &field("y"))?,
                    coord(w, &field("width"))?,
                    coord(h, &field("height"))?,
                ),
            ))
        })
        .collect()
}

fn coord(value: i64, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| OmrError::storage(format!("{what} out of range: {value}")))
}
