//! Geomodel persistence.
//!
//! Readers and writers are trait-based so other formats can be added next to
//! the JSON one. Only finalized models are written; a loaded model has its
//! lookup tables rebuilt and its invariants re-checked before it is returned.

pub mod json;

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::geomodel::GeoModel;
use crate::model_error::GeoModelError;

pub use json::JsonGeoModelIo;

/// Trait for geomodel readers.
pub trait GeoModelReader {
    /// Parse a finalized geomodel from a reader.
    fn read<R: Read>(&self, reader: R) -> Result<GeoModel, GeoModelError>;
}

/// Trait for geomodel writers.
pub trait GeoModelWriter {
    /// Serialize a finalized geomodel to a writer.
    fn write<W: Write>(&self, writer: W, model: &GeoModel) -> Result<(), GeoModelError>;
}

/// Saves `model` to `path`, choosing the format from the file extension.
pub fn save_geomodel(model: &GeoModel, path: impl AsRef<Path>) -> Result<(), GeoModelError> {
    let path = path.as_ref();
    if !model.is_finalized() {
        return Err(GeoModelError::NotFinalized);
    }
    match extension(path)?.as_str() {
        "json" => {
            let mut writer = BufWriter::new(File::create(path)?);
            JsonGeoModelIo::default().write(&mut writer, model)?;
            writer.flush()?;
        }
        other => return Err(GeoModelError::UnsupportedFormat(other.to_string())),
    }
    log::info!("geomodel saved to {}", path.display());
    Ok(())
}

/// Loads a finalized geomodel from `path`.
pub fn load_geomodel(path: impl AsRef<Path>) -> Result<GeoModel, GeoModelError> {
    let path = path.as_ref();
    match extension(path)?.as_str() {
        "json" => JsonGeoModelIo::default().read(BufReader::new(File::open(path)?)),
        other => Err(GeoModelError::UnsupportedFormat(other.to_string())),
    }
}

fn extension(path: &Path) -> Result<String, GeoModelError> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or_else(|| GeoModelError::UnsupportedFormat(path.display().to_string()))
}
