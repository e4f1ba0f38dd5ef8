use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::bitmap::binary_image::BinaryImage;
use crate::bitmap::features::DEFAULT_GRID;
use crate::error::{OcrError, Result};
use crate::network::encoding::Encoding;
use crate::network::network::Network;
use crate::ocr::samples::{Sample, SampleStore};
use crate::train::cycle_stats::CycleStats;
use crate::train::train_config::TrainConfig;
use crate::train::trainer::train_network;

/// Marker emitted for a glyph no class is close enough to.
pub const UNKNOWN_GLYPH: &str = "?";

/// How `recognize_string` cuts an image into glyphs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Segmentation {
    /// Treat the whole image as one glyph.
    Whole,
    /// Split at blank columns.
    #[default]
    Columns,
    /// Split at blank rows.
    Rows,
    /// Connected components; for glyphs that overlap column-wise.
    Connected,
}

impl Segmentation {
    pub const ALL: [Segmentation; 4] =
        [Segmentation::Whole, Segmentation::Columns, Segmentation::Rows, Segmentation::Connected];

    pub fn name(&self) -> &'static str {
        match self {
            Segmentation::Whole => "whole",
            Segmentation::Columns => "columns",
            Segmentation::Rows => "rows",
            Segmentation::Connected => "connected",
        }
    }

    /// Cuts `image` into one image per glyph.
    pub fn apply(&self, image: &BinaryImage) -> Result<Vec<BinaryImage>> {
        let glyphs = match self {
            Segmentation::Whole => return Ok(vec![image.clone()]),
            Segmentation::Columns => image.split_by_columns(),
            Segmentation::Rows => image.split_by_rows(),
            Segmentation::Connected => image.split_connected(),
        };
        glyphs.iter().map(|glyph| BinaryImage::from_glyph(glyph)).collect()
    }
}

impl FromStr for Segmentation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Segmentation::ALL
            .into_iter()
            .find(|mode| mode.name() == s)
            .ok_or_else(|| format!("unknown segmentation mode {s:?}"))
    }
}

impl fmt::Display for Segmentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A glyph recognizer: a network, the feature grid its inputs come from, and
/// the labelled sample images it is trained on.
///
/// Class edits go through this type so the sample store always mirrors the
/// network's class list.
#[derive(Debug, Clone)]
pub struct OcrNetwork {
    network: Network,
    grid: (u32, u32),
    samples: SampleStore,
}

impl Default for OcrNetwork {
    fn default() -> Self {
        OcrNetwork::new(Encoding::default())
    }
}

impl OcrNetwork {
    pub fn new(encoding: Encoding) -> Self {
        OcrNetwork {
            network: Network::new(encoding),
            grid: DEFAULT_GRID,
            samples: SampleStore::new(),
        }
    }

    pub fn with_classes<I, S>(encoding: Encoding, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ocr = OcrNetwork::new(encoding);
        for class in classes {
            ocr.add_class(class);
        }
        ocr
    }

    /// Assembles a recognizer from already-built parts.
    pub fn from_parts(network: Network, grid: (u32, u32), samples: SampleStore) -> Self {
        let mut ocr = OcrNetwork { network, grid, samples };
        for class in ocr.network.classes().to_vec() {
            ocr.samples.ensure_class(&class);
        }
        ocr
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    /// Direct access for layer and encoding edits.
    pub fn network_mut(&mut self) -> &mut Network {
        &mut self.network
    }

    pub fn grid(&self) -> (u32, u32) {
        self.grid
    }

    pub fn input_size(&self) -> usize {
        (self.grid.0 * self.grid.1) as usize
    }

    pub fn samples(&self) -> &SampleStore {
        &self.samples
    }

    pub fn classes(&self) -> &[String] {
        self.network.classes()
    }

    pub fn add_class(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        self.samples.ensure_class(&name);
        self.network.add_class(name)
    }

    /// Removes the class and all of its samples.
    pub fn remove_class(&mut self, name: &str) -> bool {
        self.samples.remove_class(name);
        self.network.remove_class(name)
    }

    pub fn add_sample(&mut self, class: &str, sample: impl Into<Sample>) -> Result<()> {
        if self.network.class_index(class).is_none() {
            return Err(OcrError::UnknownClass(class.to_owned()));
        }
        self.samples.push(class, sample.into());
        Ok(())
    }

    pub fn remove_sample(&mut self, class: &str, index: usize) -> Option<Sample> {
        self.samples.remove(class, index)
    }

    /// Image of sample `index` of `class`, decoding file samples.
    pub fn image(&self, class: &str, index: usize) -> Result<BinaryImage> {
        self.samples
            .get(class, index)
            .ok_or_else(|| OcrError::UnknownClass(format!("{class} (sample {index})")))?
            .resolve()
    }

    pub fn images<'a>(&'a self, class: &str) -> impl Iterator<Item = Result<BinaryImage>> + 'a {
        self.samples.samples(class).iter().map(Sample::resolve)
    }

    /// Sets the feature grid and initializes the network for it.
    pub fn initialize(&mut self, grid: (u32, u32)) {
        self.initialize_with(grid, &mut rand::thread_rng());
    }

    pub fn initialize_with<R: Rng + ?Sized>(&mut self, grid: (u32, u32), rng: &mut R) {
        self.grid = grid;
        let input_size = self.input_size();
        self.network.initialize_with(input_size, rng);
    }

    /// Recentred feature vector of an image under the current grid.
    pub fn features(&self, image: &BinaryImage) -> Result<Vec<f64>> {
        let mut image = image.clone();
        image.recenter();
        image.feature_vector(self.grid)
    }

    /// Feature vectors of every sample with their encoded targets, class by
    /// class. Blank samples have no features and are skipped.
    pub fn load_samples(&self) -> Result<(Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let mut examples = Vec::new();
        let mut targets = Vec::new();
        for (index, class) in self.network.classes().iter().enumerate() {
            let target = self.network.target_for_index(index);
            for (i, image) in self.images(class).enumerate() {
                match self.features(&image?) {
                    Ok(features) => {
                        examples.push(features);
                        targets.push(target.clone());
                    }
                    Err(OcrError::DegenerateVector) => {
                        log::warn!("sample {i} of class {class:?} is blank, skipping it");
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok((examples, targets))
    }

    /// Vectorizes every sample and trains on them.
    pub fn train(&mut self, config: &TrainConfig) -> Result<Vec<CycleStats>> {
        let (examples, targets) = self.load_samples()?;
        train_network(&mut self.network, &examples, &targets, config)
    }

    /// Candidate classes for a single glyph image, most probable first.
    pub fn recognize_character(&self, image: &BinaryImage, max_distance: f64) -> Result<Vec<String>> {
        let features = self.features(image)?;
        self.network.classify(&features, max_distance)
    }

    /// Candidate readings of a whole image, most probable first.
    ///
    /// The image is cut into glyphs by `segmentation`; each glyph
    /// contributes its candidate classes, or `"?"` when it has none (or is
    /// blank). The result is every combination of per-glyph candidates.
    pub fn recognize_string(
        &self,
        image: &BinaryImage,
        segmentation: Segmentation,
        max_distance: f64,
    ) -> Result<Vec<String>> {
        let mut readings = vec![String::new()];
        for glyph in segmentation.apply(image)? {
            let mut candidates = match self.recognize_character(&glyph, max_distance) {
                Ok(candidates) => candidates,
                Err(OcrError::DegenerateVector) => Vec::new(),
                Err(e) => return Err(e),
            };
            if candidates.is_empty() {
                candidates.push(UNKNOWN_GLYPH.to_owned());
            }
            readings = readings.iter()
                .flat_map(|prefix| candidates.iter().map(move |c| format!("{prefix}{c}")))
                .collect();
        }
        Ok(readings)
    }
}
