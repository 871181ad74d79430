/// Equal slot partitioning of a region block
use serde::{Deserialize, Serialize};

/// Direction along which a block is divided into slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// Slots side by side, left to right (the width is split)
    Horizontal,
    /// Slots stacked top to bottom (the height is split)
    Vertical,
}

/// Pixel rectangle of one slot inside a block, `[x0, x1) x [y0, y1)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBounds {
    /// Left, inclusive
    pub x0: usize,
    /// Top, inclusive
    pub y0: usize,
    /// Right, exclusive
    pub x1: usize,
    /// Bottom, exclusive
    pub y1: usize,
}

impl SlotBounds {
    /// Pixel count
    pub fn area(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

/// Split a `width` x `height` block into `slots` contiguous, non-overlapping slots
///
/// Slot `i` spans `[i * len / n, (i + 1) * len / n)` along the axis, so the
/// slots always tile the block exactly even when `len` is not divisible by `n`.
pub fn slot_bounds(width: usize, height: usize, axis: Axis, slots: usize) -> Vec<SlotBounds> {
    let slots = slots.max(1);
    let len = match axis {
        Axis::Horizontal => width,
        Axis::Vertical => height,
    };

    (0..slots)
        .map(|i| {
            let start = i * len / slots;
            let end = (i + 1) * len / slots;
            match axis {
                Axis::Horizontal => SlotBounds {
                    x0: start,
                    y0: 0,
                    x1: end,
                    y1: height,
                },
                Axis::Vertical => SlotBounds {
                    x0: 0,
                    y0: start,
                    x1: width,
                    y1: end,
                },
            }
        })
        .collect()
}
