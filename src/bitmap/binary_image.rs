use std::io::Cursor;
use std::path::Path;

use image::{imageops, DynamicImage, GenericImageView, GrayImage, ImageOutputFormat, Luma};

use crate::error::{OcrError, Result};

/// Luminance threshold used when none is given.
pub const DEFAULT_THRESHOLD: u8 = 128;

const BLACK: Luma<u8> = Luma([0]);
const WHITE: Luma<u8> = Luma([255]);

/// A black-and-white image.
///
/// Pixels are stored in an 8-bit grayscale buffer holding only 0 (black)
/// and 255 (white); every constructor and operation preserves that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryImage {
    pub(crate) image: GrayImage,
}

impl BinaryImage {
    /// An all-white image.
    pub fn blank(width: u32, height: u32) -> Result<BinaryImage> {
        if width == 0 || height == 0 {
            return Err(OcrError::InvalidImage(format!("zero-area image {width}x{height}")));
        }
        Ok(BinaryImage { image: GrayImage::from_pixel(width, height, WHITE) })
    }

    /// Thresholds any decoded image: luminance below `threshold` becomes
    /// black. Transparent pixels are first composited onto white.
    pub fn from_dynamic(source: &DynamicImage, threshold: u8) -> Result<BinaryImage> {
        let (width, height) = source.dimensions();
        let mut binary = BinaryImage::blank(width, height)?;
        for (x, y, pixel) in source.to_rgba8().enumerate_pixels() {
            let [r, g, b, a] = pixel.0;
            let over_white = |c: u8| (c as u32 * a as u32 + 255 * (255 - a as u32) + 127) / 255;
            let luma = (over_white(r) * 299 + over_white(g) * 587 + over_white(b) * 114) / 1000;
            if luma < threshold as u32 {
                binary.image.put_pixel(x, y, BLACK);
            }
        }
        Ok(binary)
    }

    /// Decodes PNG/JPEG/BMP/GIF bytes and thresholds them. Bytes that do
    /// not decode are an [`OcrError::InvalidImage`].
    pub fn from_bytes(bytes: &[u8], threshold: u8) -> Result<BinaryImage> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
        BinaryImage::from_dynamic(&decoded, threshold)
    }

    /// Missing, unreadable and undecodable files are all
    /// [`OcrError::InvalidImage`], naming the path.
    pub fn open(path: impl AsRef<Path>, threshold: u8) -> Result<BinaryImage> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .map_err(|e| OcrError::InvalidImage(format!("{}: {e}", path.display())))?;
        BinaryImage::from_dynamic(&decoded, threshold)
    }

    /// Draws the given black pixels on an image sized to their bounding box.
    pub fn from_glyph(pixels: &[(u32, u32)]) -> Result<BinaryImage> {
        let (Some(x0), Some(y0), Some(x1), Some(y1)) = (
            pixels.iter().map(|p| p.0).min(),
            pixels.iter().map(|p| p.1).min(),
            pixels.iter().map(|p| p.0).max(),
            pixels.iter().map(|p| p.1).max(),
        ) else {
            return Err(OcrError::InvalidImage("no black pixels to draw".to_owned()));
        };
        let mut binary = BinaryImage::blank(x1 - x0 + 1, y1 - y0 + 1)?;
        for &(x, y) in pixels {
            binary.image.put_pixel(x - x0, y - y0, BLACK);
        }
        Ok(binary)
    }

    /// Builds an image from rows of `'#'` (black) and any other char (white).
    /// Handy for drawing small fixtures.
    pub fn from_ascii(rows: &[&str]) -> Result<BinaryImage> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as u32;
        let mut binary = BinaryImage::blank(width, height)?;
        for (y, row) in rows.iter().enumerate() {
            for (x, c) in row.chars().enumerate() {
                if c == '#' {
                    binary.image.put_pixel(x as u32, y as u32, BLACK);
                }
            }
        }
        Ok(binary)
    }

    /// PNG encoding of the image.
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        DynamicImage::ImageLuma8(self.image.clone())
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
        Ok(bytes)
    }

    /// Writes the image, format chosen from the file extension.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.image.save(path)?;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Panics if `(x, y)` is out of bounds.
    pub fn is_black(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y).0[0] == 0
    }

    pub fn set(&mut self, x: u32, y: u32, black: bool) {
        self.image.put_pixel(x, y, if black { BLACK } else { WHITE });
    }

    pub fn black_count(&self) -> usize {
        self.image.pixels().filter(|p| p.0[0] == 0).count()
    }

    /// Black pixel coordinates, column by column.
    pub fn black_pixels(&self) -> Vec<(u32, u32)> {
        let (width, height) = self.dimensions();
        (0..width)
            .flat_map(|x| (0..height).map(move |y| (x, y)))
            .filter(|&(x, y)| self.is_black(x, y))
            .collect()
    }

    /// Rotates counter-clockwise by `angle` degrees, in place.
    ///
    /// Quarter turns are exact and swap width and height. Other angles use
    /// nearest-neighbour sampling; area uncovered by the source is filled
    /// with white. Without `expand` the canvas keeps its size and corners
    /// are clipped; with it the canvas grows to hold the whole rotation.
    pub fn rotate(&mut self, angle: f64, expand: bool) {
        if angle % 90.0 == 0.0 {
            self.image = match (angle / 90.0).rem_euclid(4.0) as u32 {
                1 => imageops::rotate270(&self.image),
                2 => imageops::rotate180(&self.image),
                3 => imageops::rotate90(&self.image),
                _ => return,
            };
            return;
        }

        let (width, height) = self.dimensions();
        let theta = angle.to_radians();
        let (sin, cos) = theta.sin_cos();
        let (out_w, out_h) = if expand {
            let w = (width as f64 * cos.abs() + height as f64 * sin.abs()).ceil() as u32;
            let h = (width as f64 * sin.abs() + height as f64 * cos.abs()).ceil() as u32;
            (w.max(1), h.max(1))
        } else {
            (width, height)
        };

        let (cx, cy) = (width as f64 / 2.0, height as f64 / 2.0);
        let (ox, oy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);
        let mut rotated = GrayImage::from_pixel(out_w, out_h, WHITE);
        for (x, y, pixel) in rotated.enumerate_pixels_mut() {
            let dx = x as f64 + 0.5 - ox;
            let dy = y as f64 + 0.5 - oy;
            let sx = (cx + cos * dx - sin * dy).floor();
            let sy = (cy + sin * dx + cos * dy).floor();
            if sx >= 0.0 && sy >= 0.0 && sx < width as f64 && sy < height as f64 {
                *pixel = *self.image.get_pixel(sx as u32, sy as u32);
            }
        }
        self.image = rotated;
    }

    /// Crops to the `width × height` region whose top-left corner is `(x, y)`.
    pub fn crop(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.image = imageops::crop_imm(&self.image, x, y, width, height).to_image();
    }
}
