use thiserror::Error;

/// Every recoverable failure the recognizer can report.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("invalid image: {0}")]
    InvalidImage(String),
    #[error("feature vector has zero norm (blank glyph)")]
    DegenerateVector,
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("network structure changed since last initialization")]
    UninitializedNetwork,
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("unknown class: {0}")]
    UnknownClass(String),
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
    #[error("invalid layer index {0}")]
    InvalidLayer(usize),
    #[error("no training examples left after the validation split")]
    EmptyTrainingSet,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Archive(#[from] zip::result::ZipError),
}

pub type Result<T> = std::result::Result<T, OcrError>;
