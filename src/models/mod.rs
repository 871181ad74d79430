pub mod matrix;
pub mod outcome;
pub mod point;
pub mod rect;
pub mod scan;
pub mod template;

pub use matrix::BitMatrix;
pub use outcome::{AMBIGUOUS_SYMBOL, DetectionOutcome, UNMARKED_SYMBOL};
pub use point::Point;
pub use rect::{IndexedRect, Rect, RegionGroup};
pub use scan::{ScanFailure, ScanReport, ScanRow, ScanWarning};
pub use template::{Template, TemplateBuilder};
