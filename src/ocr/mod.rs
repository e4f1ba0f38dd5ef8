pub mod ocr_network;
pub mod samples;

pub use ocr_network::{OcrNetwork, Segmentation, UNKNOWN_GLYPH};
pub use samples::{Sample, SampleStore};
