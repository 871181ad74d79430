/// Connected components over a binarized block
/// Measures the pixel area of every 8-connected foreground region
use std::collections::HashMap;

use crate::models::BitMatrix;

/// Union-Find data structure
pub struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut node = x;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        root
    }

    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x as usize] = root_y;
        }
    }
}

/// Pixel area of every connected foreground region, largest first
pub fn component_areas(matrix: &BitMatrix) -> Vec<usize> {
    let width = matrix.width();
    let height = matrix.height();

    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    // Label 0 is background; worst case every pixel gets its own label
    let mut uf = UnionFind::new(width * height + 1);

    // First pass: provisional labels from already-visited neighbours
    for y in 0..height {
        for x in 0..width {
            if !matrix.get(x, y) {
                continue;
            }

            let mut neighbors = [0u32; 4];
            let mut count = 0;
            let mut push = |label: u32| {
                if label != 0 {
                    neighbors[count] = label;
                    count += 1;
                }
            };
            if x > 0 {
                push(labels[y * width + x - 1]);
            }
            if y > 0 {
                push(labels[(y - 1) * width + x]);
                if x > 0 {
                    push(labels[(y - 1) * width + x - 1]);
                }
                if x + 1 < width {
                    push(labels[(y - 1) * width + x + 1]);
                }
            }

            let idx = y * width + x;
            if count == 0 {
                labels[idx] = next_label;
                next_label += 1;
            } else {
                let min_label = neighbors[..count].iter().copied().min().unwrap_or(0);
                labels[idx] = min_label;
                for &l in &neighbors[..count] {
                    if l != min_label {
                        uf.union(min_label, l);
                    }
                }
            }
        }
    }

    // Second pass: accumulate area per root
    let mut areas: HashMap<u32, usize> = HashMap::new();
    for &label in &labels {
        if label == 0 {
            continue;
        }
        *areas.entry(uf.find(label)).or_insert(0) += 1;
    }

    let mut areas: Vec<usize> = areas.into_values().collect();
    areas.sort_unstable_by(|a, b| b.cmp(a));
    areas
}
