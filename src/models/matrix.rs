/// Compact bit matrix holding a binarized block (true = ink/foreground)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitMatrix {
    /// Create an all-background matrix with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let words_needed = (width * height).div_ceil(64);
        Self {
            width,
            height,
            words: vec![0; words_needed],
        }
    }

    /// Build a matrix by evaluating `f(x, y)` for every cell
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> bool) -> Self {
        let mut matrix = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if f(x, y) {
                    matrix.set(x, y, true);
                }
            }
        }
        matrix
    }

    /// Get matrix width
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y); out-of-range reads are background
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        (self.words[index / 64] >> (index % 64)) & 1 == 1
    }

    /// Set bit at (x, y); out-of-range writes are ignored
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let mask = 1u64 << (index % 64);
        if value {
            self.words[index / 64] |= mask;
        } else {
            self.words[index / 64] &= !mask;
        }
    }

    /// Number of foreground cells
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Copy of this matrix with everything outside `[x0, x1) x [y0, y1)` cleared
    ///
    /// Equivalent to AND-ing with a filled rectangular mask of the same size.
    pub fn masked_to(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> BitMatrix {
        let x1 = x1.min(self.width);
        let y1 = y1.min(self.height);
        let mut out = BitMatrix::new(self.width, self.height);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x, y) {
                    out.set(x, y, true);
                }
            }
        }
        out
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
