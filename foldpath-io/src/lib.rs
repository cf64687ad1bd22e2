//! foldpath-io: File formats for native contact analysis.
//!
//! This crate reads contact tables and multi-model PDB trajectories and
//! persists every analysis stage as CSV (or JSON for classifications).
//!

mod classification;
mod contacts;
mod error;
mod pdb;
mod records;

pub use classification::{
    read_classification_json, write_classification_json, write_classification_text,
};
pub use contacts::{read_contact_map, read_raw_contacts, write_contact_map};
pub use error::{Error, Result};
pub use pdb::PdbFrameReader;
pub use records::{
    read_frame_records, read_summary, write_frame_records, write_smoothed, write_summary,
    FrameRecordWriter,
};

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Opens a file for buffered reading.
///
/// # Errors
/// Returns `Error::Io` if the file cannot be opened.
pub fn open<P: AsRef<Path>>(path: P) -> Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

/// Creates (or truncates) a file for buffered writing, creating parent
/// directories as needed.
///
/// # Errors
/// Returns `Error::Io` if the file or its directory cannot be created.
pub fn create<P: AsRef<Path>>(path: P) -> Result<BufWriter<File>> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}
