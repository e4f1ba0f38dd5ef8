use serde::{Deserialize, Serialize};

use crate::bitmap::features::DEFAULT_GRID;
use crate::error::{OcrError, Result};
use crate::layers::dense::Layer;
use crate::layers::unit::Unit;
use crate::network::encoding::Encoding;
use crate::network::network::Network;
use crate::ocr::ocr_network::OcrNetwork;
use crate::ocr::samples::SampleStore;

/// The network half of a saved recognizer: everything except the samples.
///
/// Every field is optional on load so files written by older versions (or
/// by hand) still open; missing values fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    /// Encoding name, `"one_hot"` or `"binary"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    /// Layers → units → weights (bias weight last).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure: Option<Vec<Vec<Vec<f64>>>>,
    /// Feature grid as `[columns, rows]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid: Option<(u32, u32)>,
}

impl NetworkRecord {
    pub fn from_network(ocr: &OcrNetwork) -> Self {
        let network = ocr.network();
        let structure = network.layers()
            .map(|layer| layer.units().iter().map(|unit| unit.weights().to_vec()).collect())
            .collect();
        NetworkRecord {
            encoding: Some(network.encoding().name().to_owned()),
            classes: network.classes().to_vec(),
            structure: Some(structure),
            grid: Some(ocr.grid()),
        }
    }

    /// Names of the optional fields this record lacks; each one is
    /// replaced by a default when the record is loaded.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.encoding.is_none() {
            missing.push("encoding");
        }
        if self.structure.as_ref().map_or(true, Vec::is_empty) {
            missing.push("structure");
        }
        if self.grid.is_none() {
            missing.push("grid");
        }
        missing
    }

    /// Rebuilds a recognizer with an empty sample store.
    ///
    /// An unknown encoding name is an error. A missing structure yields an
    /// uninitialized network sized from the class list.
    pub fn into_network(self) -> Result<OcrNetwork> {
        for field in self.missing_fields() {
            log::warn!("{}, using the default", OcrError::CorruptRecord(format!("missing `{field}`")));
        }
        let encoding = match self.encoding.as_deref() {
            Some(name) => name.parse::<Encoding>()?,
            None => Encoding::default(),
        };
        let grid = self.grid.unwrap_or(DEFAULT_GRID);

        let network = match self.structure {
            Some(structure) if !structure.is_empty() => {
                let layers = structure.into_iter()
                    .map(|units| Layer::from_units(units.into_iter().map(Unit::from_weights).collect()))
                    .collect();
                Network::from_parts(encoding, self.classes, layers, (grid.0 * grid.1) as usize)
            }
            _ => Network::with_classes(encoding, self.classes),
        };
        Ok(OcrNetwork::from_parts(network, grid, SampleStore::new()))
    }
}
