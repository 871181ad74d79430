use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in pixel coordinates of the reference frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: u32,
    /// Top edge
    pub y: u32,
    /// Width in pixels (> 0)
    pub width: u32,
    /// Height in pixels (> 0)
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Build a rectangle from two opposite corners given in any order.
    ///
    /// Returns `None` for a degenerate (zero width or height) pair.
    pub fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Option<Self> {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        let rect = Self::new(left, top, right - left, bottom - top);
        rect.is_valid().then_some(rect)
    }

    /// Opposite corners `[x1, y1, x2, y2]`, exclusive on the right/bottom
    pub fn corners(&self) -> [u32; 4] {
        [self.x, self.y, self.right(), self.bottom()]
    }

    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x.saturating_add(self.width)
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y.saturating_add(self.height)
    }

    /// Pixel area
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Both dimensions are positive
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether the rectangle lies entirely within a `width` x `height` image
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.is_valid()
            && (self.x as u64 + self.width as u64) <= width as u64
            && (self.y as u64 + self.height as u64) <= height as u64
    }
}

/// Numbered region of an ordered group (digit slot or question)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexedRect {
    /// 1-based position within the group
    pub index: u32,
    /// Region in reference coordinates
    pub rect: Rect,
}

impl IndexedRect {
    /// Create a new indexed region
    pub fn new(index: u32, rect: Rect) -> Self {
        Self { index, rect }
    }
}

/// Which logical field a region belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionGroup {
    /// Question paper series code
    Series,
    /// Roll-number digit columns
    RollNumber,
    /// Question-bank number digit columns
    QuestionBank,
    /// Answer option rows
    Question,
}

impl std::fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegionGroup::Series => write!(f, "series"),
            RegionGroup::RollNumber => write!(f, "roll number"),
            RegionGroup::QuestionBank => write!(f, "question bank"),
            RegionGroup::Question => write!(f, "question"),
        }
    }
}
