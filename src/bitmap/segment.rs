use std::collections::HashMap;

use crate::bitmap::binary_image::BinaryImage;

/// Black-pixel coordinates of one isolated glyph, in source image space.
pub type Glyph = Vec<(u32, u32)>;

/// Runs narrower than this are dropped as noise by the column/row splitters.
pub const MIN_GLYPH_WIDTH: u32 = 6;

/// Axis-aligned rectangle; `x`, `y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BinaryImage {
    /// Smallest rectangle holding every black pixel, grown by one pixel on
    /// each side where the image allows. An all-white image yields its full
    /// bounds.
    pub fn bounding_box(&self) -> Rect {
        let (width, height) = self.dimensions();
        let pixels = self.black_pixels();
        let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
            pixels.iter().map(|p| p.0).min(),
            pixels.iter().map(|p| p.1).min(),
            pixels.iter().map(|p| p.0).max(),
            pixels.iter().map(|p| p.1).max(),
        ) else {
            return Rect { x: 0, y: 0, width, height };
        };
        let left = x0.saturating_sub(1);
        let top = y0.saturating_sub(1);
        let right = (x1 + 1).min(width - 1);
        let bottom = (y1 + 1).min(height - 1);
        Rect { x: left, y: top, width: right - left + 1, height: bottom - top + 1 }
    }

    /// Crops the image to its bounding box.
    pub fn recenter(&mut self) {
        let Rect { x, y, width, height } = self.bounding_box();
        if (x, y, width, height) != (0, 0, self.width(), self.height()) {
            self.crop(x, y, width, height);
        }
    }

    /// Splits the image at blank columns, left to right.
    ///
    /// Every maximal run of columns containing black becomes one glyph,
    /// except runs narrower than `MIN_GLYPH_WIDTH`, which are dropped.
    pub fn split_by_columns(&self) -> Vec<Glyph> {
        self.split_by_columns_min(MIN_GLYPH_WIDTH)
    }

    /// `split_by_columns` with an explicit minimum glyph width.
    pub fn split_by_columns_min(&self, min_width: u32) -> Vec<Glyph> {
        let (width, height) = self.dimensions();
        let mut glyphs = Vec::new();
        let mut current: Glyph = Vec::new();
        let mut run_start = None;

        for x in 0..=width {
            let column: Vec<(u32, u32)> = if x < width {
                (0..height).filter(|&y| self.is_black(x, y)).map(|y| (x, y)).collect()
            } else {
                Vec::new()
            };
            if !column.is_empty() {
                run_start.get_or_insert(x);
                current.extend(column);
            } else if let Some(start) = run_start.take() {
                let glyph = std::mem::take(&mut current);
                if x - start >= min_width {
                    glyphs.push(glyph);
                } else {
                    log::debug!("dropping {}-column speck at x = {start}", x - start);
                }
            }
        }
        glyphs
    }

    /// Splits the image at blank rows, top to bottom.
    pub fn split_by_rows(&self) -> Vec<Glyph> {
        self.split_by_rows_min(MIN_GLYPH_WIDTH)
    }

    /// Same algorithm as `split_by_columns_min`, run on the image turned a
    /// quarter counter-clockwise; coordinates are mapped back.
    pub fn split_by_rows_min(&self, min_height: u32) -> Vec<Glyph> {
        let width = self.width();
        let mut turned = self.clone();
        turned.rotate(90.0, false);
        turned.split_by_columns_min(min_height)
            .into_iter()
            .map(|glyph| glyph.into_iter().map(|(rx, ry)| (width - 1 - ry, rx)).collect())
            .collect()
    }

    /// Connected components of black pixels under 4-connectivity.
    ///
    /// Components are listed in the order their first pixel is met when
    /// scanning column by column; no caller should rely on that order.
    pub fn split_connected(&self) -> Vec<Glyph> {
        let pixels = self.black_pixels();
        let index: HashMap<(u32, u32), usize> = pixels.iter().enumerate()
            .map(|(i, &p)| (p, i))
            .collect();

        let mut sets = DisjointSets::new(pixels.len());
        for (i, &(x, y)) in pixels.iter().enumerate() {
            for neighbour in [(x + 1, y), (x, y + 1)] {
                if let Some(&j) = index.get(&neighbour) {
                    sets.union(i, j);
                }
            }
        }

        let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
        let mut glyphs: Vec<Glyph> = Vec::new();
        for (i, &p) in pixels.iter().enumerate() {
            let root = sets.find(i);
            let slot = *slot_of_root.entry(root).or_insert_with(|| {
                glyphs.push(Vec::new());
                glyphs.len() - 1
            });
            glyphs[slot].push(p);
        }
        glyphs
    }
}

/// Union-find with path halving and union by size.
struct DisjointSets {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl DisjointSets {
    fn new(n: usize) -> Self {
        DisjointSets { parent: (0..n).collect(), size: vec![1; n] }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let (mut a, mut b) = (self.find(a), self.find(b));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}
