use crate::bitmap::binary_image::BinaryImage;
use crate::error::{OcrError, Result};

/// Feature grid used when none is configured: 3 columns, 5 rows.
pub const DEFAULT_GRID: (u32, u32) = (3, 5);

impl BinaryImage {
    /// Ink density per cell of a `gx × gy` grid, L2-normalized.
    ///
    /// Cells are `ceil(width / gx) × ceil(height / gy)` pixels, so the last
    /// cell along each axis absorbs the remainder (and may be partly empty).
    /// Cells are numbered row by row, left to right. A blank image has no
    /// direction to normalize and yields `DegenerateVector`.
    pub fn feature_vector(&self, grid: (u32, u32)) -> Result<Vec<f64>> {
        let (gx, gy) = grid;
        if gx == 0 || gy == 0 {
            return Err(OcrError::InvalidConfig(format!("feature grid {gx}x{gy} has no cells")));
        }
        let (width, height) = self.dimensions();
        let cell_w = width.div_ceil(gx);
        let cell_h = height.div_ceil(gy);

        let mut counts = vec![0.0; (gx * gy) as usize];
        for (x, y) in self.black_pixels() {
            let cell = (x / cell_w) % gx + (y / cell_h) * gx;
            counts[cell as usize] += 1.0;
        }

        let area = (cell_w * cell_h) as f64;
        let densities: Vec<f64> = counts.into_iter().map(|c| c / area).collect();
        let norm = densities.iter().map(|d| d * d).sum::<f64>().sqrt();
        if norm == 0.0 {
            return Err(OcrError::DegenerateVector);
        }
        Ok(densities.into_iter().map(|d| d / norm).collect())
    }
}
