use std::io::{Read, Seek, Write};

use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::bitmap::binary_image::{BinaryImage, DEFAULT_THRESHOLD};
use crate::error::{OcrError, Result};
use crate::ocr::ocr_network::OcrNetwork;
use crate::persist::record::NetworkRecord;

/// Archive entry holding the network record.
pub const NETWORK_ENTRY: &str = "network.json";

/// Directory name standing in for a class literally named `/`.
pub const SLASH_PLACEHOLDER: &str = "__slash__";

fn class_dir(class: &str) -> &str {
    if class == "/" { SLASH_PLACEHOLDER } else { class }
}

fn class_from_dir(dir: &str) -> &str {
    if dir == SLASH_PLACEHOLDER { "/" } else { dir }
}

/// Writes `network.json` plus one `<class>/<index>.png` entry per sample.
pub fn write_archive<W: Write + Seek>(ocr: &OcrNetwork, writer: W) -> Result<()> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default();

    zip.start_file(NETWORK_ENTRY, options)?;
    serde_json::to_writer(&mut zip, &NetworkRecord::from_network(ocr))?;

    for class in ocr.classes() {
        for (index, image) in ocr.images(class).enumerate() {
            zip.start_file(format!("{}/{index}.png", class_dir(class)), options)?;
            zip.write_all(&image?.to_png()?)?;
        }
    }
    zip.finish()?;
    Ok(())
}

pub fn read_archive<R: Read + Seek>(reader: R) -> Result<OcrNetwork> {
    let mut archive = ZipArchive::new(reader)?;

    let record: NetworkRecord = match archive.by_name(NETWORK_ENTRY) {
        Ok(entry) => serde_json::from_reader(entry)
            .map_err(|e| OcrError::CorruptRecord(format!("{NETWORK_ENTRY}: {e}")))?,
        Err(ZipError::FileNotFound) => {
            return Err(OcrError::CorruptRecord(format!("archive has no {NETWORK_ENTRY}")));
        }
        Err(e) => return Err(e.into()),
    };
    let mut ocr = record.into_network()?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_owned();
        if name.ends_with('/') {
            continue;
        }
        let Some((dir, file)) = name.rsplit_once('/') else {
            continue;
        };
        let index = file.strip_suffix(".png")
            .and_then(|stem| stem.parse::<usize>().ok())
            .unwrap_or(usize::MAX);
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        entries.push((class_from_dir(dir).to_owned(), index, bytes));
    }
    entries.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));

    for (class, _, bytes) in entries {
        if !ocr.classes().contains(&class) {
            log::warn!("dropping archived sample of undeclared class {class:?}");
            continue;
        }
        ocr.add_sample(&class, BinaryImage::from_bytes(&bytes, DEFAULT_THRESHOLD)?)?;
    }
    Ok(ocr)
}
