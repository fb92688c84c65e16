//! METS manifest parsing and ingestion.

mod dublin_core;
pub mod error;
pub mod extract;
mod ingest;
pub mod path;
pub mod transform;
pub mod xml;

use std::path::{Path, PathBuf};
use std::str::FromStr;

pub use dublin_core::resolve as resolve_dublin_core;
pub use error::{IngestError, ManifestError};
pub use ingest::{ingest, IngestReport};
pub use path::ElementPath;
pub use xml::Element;

/// A loaded METS document with namespace prefixes stripped.
#[derive(Debug, Clone)]
pub struct Mets {
    path: Option<PathBuf>,
    root: Element,
}

impl Mets {
    /// Reads and parses the METS file at `path`.
    pub fn open(path: &Path) -> Result<Self, ManifestError> {
        let xml = std::fs::read_to_string(path).map_err(|e| ManifestError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut mets: Mets = xml.parse()?;
        mets.path = Some(path.to_path_buf());
        Ok(mets)
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl FromStr for Mets {
    type Err = ManifestError;

    fn from_str(xml: &str) -> Result<Self, Self::Err> {
        Ok(Self {
            path: None,
            root: xml::parse(xml)?,
        })
    }
}
