pub mod binary_image;
pub mod denoise;
pub mod features;
pub mod segment;

pub use binary_image::{BinaryImage, DEFAULT_THRESHOLD};
pub use denoise::Axis;
pub use features::DEFAULT_GRID;
pub use segment::{Glyph, Rect, MIN_GLYPH_WIDTH};
