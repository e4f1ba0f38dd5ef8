use crate::bitmap::binary_image::BinaryImage;

/// Scan direction of a denoise pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Runs of black pixels along each row.
    Rows,
    /// Runs of black pixels along each column.
    Columns,
}

impl BinaryImage {
    /// Whitens every maximal run of black pixels along `axis` whose length
    /// is at most `threshold`. Never adds black pixels.
    pub fn denoise_axis(&mut self, axis: Axis, threshold: u32) {
        match axis {
            Axis::Rows => self.denoise_rows(threshold),
            Axis::Columns => {
                self.rotate(90.0, false);
                self.denoise_rows(threshold);
                self.rotate(-90.0, false);
            }
        }
    }

    /// Both passes: rows first, then columns. Removes specks and thin
    /// ruling lines up to `threshold` pixels thick.
    pub fn denoise(&mut self, threshold: u32) {
        self.denoise_axis(Axis::Rows, threshold);
        self.denoise_axis(Axis::Columns, threshold);
    }

    fn denoise_rows(&mut self, threshold: u32) {
        let (width, height) = self.dimensions();
        for y in 0..height {
            let mut x = 0;
            while x < width {
                if !self.is_black(x, y) {
                    x += 1;
                    continue;
                }
                let run = (x..width).take_while(|&x2| self.is_black(x2, y)).count() as u32;
                if run <= threshold {
                    for x2 in x..x + run {
                        self.set(x2, y, false);
                    }
                }
                x += run;
            }
        }
    }
}
