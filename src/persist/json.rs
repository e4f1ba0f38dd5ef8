use std::collections::BTreeMap;
use std::io::{Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::bitmap::binary_image::{BinaryImage, DEFAULT_THRESHOLD};
use crate::error::{OcrError, Result};
use crate::ocr::ocr_network::OcrNetwork;
use crate::persist::record::NetworkRecord;

/// Single-document layout: the network record plus every sample as a
/// base64 PNG, keyed by class.
#[derive(Debug, Serialize, Deserialize)]
struct JsonDocument {
    #[serde(flatten)]
    network: NetworkRecord,
    #[serde(default)]
    samples: BTreeMap<String, Vec<String>>,
}

pub fn write_json<W: Write>(ocr: &OcrNetwork, writer: W) -> Result<()> {
    let mut samples = BTreeMap::new();
    for class in ocr.classes() {
        let encoded = ocr.images(class)
            .map(|image| -> Result<String> { Ok(STANDARD.encode(image?.to_png()?)) })
            .collect::<Result<Vec<_>>>()?;
        samples.insert(class.clone(), encoded);
    }
    let document = JsonDocument { network: NetworkRecord::from_network(ocr), samples };
    serde_json::to_writer(writer, &document)?;
    Ok(())
}

pub fn read_json<R: Read>(reader: R) -> Result<OcrNetwork> {
    let value: serde_json::Value = serde_json::from_reader(reader)
        .map_err(|e| OcrError::CorruptRecord(format!("not a JSON document: {e}")))?;
    if !value.is_object() {
        return Err(OcrError::CorruptRecord("top level is not a JSON object".to_owned()));
    }
    let document: JsonDocument = serde_json::from_value(value)
        .map_err(|e| OcrError::CorruptRecord(e.to_string()))?;

    let mut ocr = document.network.into_network()?;
    for (class, images) in document.samples {
        if !ocr.classes().contains(&class) {
            log::warn!("dropping {} samples of undeclared class {class:?}", images.len());
            continue;
        }
        for encoded in images {
            let bytes = STANDARD.decode(encoded.as_bytes())
                .map_err(|e| OcrError::CorruptRecord(format!("bad base64 sample in {class:?}: {e}")))?;
            ocr.add_sample(&class, BinaryImage::from_bytes(&bytes, DEFAULT_THRESHOLD)?)?;
        }
    }
    Ok(ocr)
}
