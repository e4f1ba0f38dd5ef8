pub mod archive;
pub mod json;
pub mod record;

pub use archive::{read_archive, write_archive};
pub use json::{read_json, write_json};
pub use record::NetworkRecord;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::ocr::ocr_network::OcrNetwork;

/// On-disk layout of a saved recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// One JSON document with base64-encoded samples.
    Json,
    /// A zip archive with `network.json` and one PNG per sample.
    Archive,
}

impl Format {
    /// `.zip` files are archives; anything else is JSON.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("zip") => Format::Archive,
            _ => Format::Json,
        }
    }
}

pub fn save(ocr: &OcrNetwork, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let format = Format::from_path(path);
    let file = File::create(path)?;
    match format {
        Format::Json => {
            let mut writer = BufWriter::new(file);
            write_json(ocr, &mut writer)?;
            writer.flush()?;
        }
        Format::Archive => write_archive(ocr, file)?,
    }
    log::info!(
        "saved {} classes and {} samples to {} ({format:?})",
        ocr.classes().len(),
        ocr.samples().total(),
        path.display()
    );
    Ok(())
}

pub fn open(path: impl AsRef<Path>) -> Result<OcrNetwork> {
    let path = path.as_ref();
    let format = Format::from_path(path);
    let file = File::open(path)?;
    let ocr = match format {
        Format::Json => read_json(BufReader::new(file))?,
        Format::Archive => read_archive(BufReader::new(file))?,
    };
    log::info!(
        "loaded {} classes and {} samples from {}",
        ocr.classes().len(),
        ocr.samples().total(),
        path.display()
    );
    Ok(ocr)
}
