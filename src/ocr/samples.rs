use std::collections::HashMap;
use std::path::PathBuf;

use crate::bitmap::binary_image::{BinaryImage, DEFAULT_THRESHOLD};
use crate::error::Result;

/// One training sample: an image in memory, or a file decoded on access.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Image(BinaryImage),
    File(PathBuf),
}

impl Sample {
    /// The sample's image; file samples are opened and thresholded now.
    pub fn resolve(&self) -> Result<BinaryImage> {
        match self {
            Sample::Image(image) => Ok(image.clone()),
            Sample::File(path) => BinaryImage::open(path, DEFAULT_THRESHOLD),
        }
    }
}

impl From<BinaryImage> for Sample {
    fn from(image: BinaryImage) -> Self {
        Sample::Image(image)
    }
}

impl From<PathBuf> for Sample {
    fn from(path: PathBuf) -> Self {
        Sample::File(path)
    }
}

/// Samples grouped by class label, each group in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SampleStore {
    by_class: HashMap<String, Vec<Sample>>,
}

impl SampleStore {
    pub fn new() -> Self {
        SampleStore::default()
    }

    /// Makes sure `class` has an (possibly empty) sample list.
    pub fn ensure_class(&mut self, class: &str) {
        self.by_class.entry(class.to_owned()).or_default();
    }

    pub fn remove_class(&mut self, class: &str) -> Option<Vec<Sample>> {
        self.by_class.remove(class)
    }

    pub fn push(&mut self, class: &str, sample: Sample) {
        self.by_class.entry(class.to_owned()).or_default().push(sample);
    }

    pub fn remove(&mut self, class: &str, index: usize) -> Option<Sample> {
        let samples = self.by_class.get_mut(class)?;
        (index < samples.len()).then(|| samples.remove(index))
    }

    pub fn get(&self, class: &str, index: usize) -> Option<&Sample> {
        self.by_class.get(class)?.get(index)
    }

    pub fn samples(&self, class: &str) -> &[Sample] {
        self.by_class.get(class).map_or(&[][..], Vec::as_slice)
    }

    pub fn len(&self, class: &str) -> usize {
        self.samples(class).len()
    }

    pub fn total(&self) -> usize {
        self.by_class.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
