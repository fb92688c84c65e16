//! Flat field extraction from METS subtrees.

use std::collections::BTreeMap;

use super::error::ManifestError;
use super::path::ElementPath;
use super::xml::Element;

/// Field name to raw text.
pub type RawFields = BTreeMap<&'static str, String>;

/// Technical metadata of an original file, relative to its `amdSec`.
pub const FILE_ELEMENTS: &[(&str, &str)] = &[
    ("filepath", "./techMD/mdWrap/xmlData/object/originalName"),
    (
        "uuid",
        "./techMD/mdWrap/xmlData/object/objectIdentifier/objectIdentifierValue",
    ),
    (
        "hashtype",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/fixity/messageDigestAlgorithm",
    ),
    (
        "hashvalue",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/fixity/messageDigest",
    ),
    (
        "size_bytes",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/size",
    ),
    (
        "fileformat",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/format/formatDesignation/formatName",
    ),
    (
        "formatversion",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/format/formatDesignation/formatVersion",
    ),
    (
        "puid",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/format/formatRegistry/formatRegistryKey",
    ),
    (
        "datemodified",
        "./techMD/mdWrap/xmlData/object/objectCharacteristics/objectCharacteristicsExtension/fits/fileinfo/fslastmodified[@toolname='OIS File Information']",
    ),
];

/// PREMIS event fields, relative to the event's `mdWrap`.
pub const PREMIS_ELEMENTS: &[(&str, &str)] = &[
    ("uuid", "./xmlData/event/eventIdentifier/eventIdentifierValue"),
    ("eventtype", "./xmlData/event/eventType"),
    ("datetime", "./xmlData/event/eventDateTime"),
    ("detail", "./xmlData/event/eventDetail"),
    (
        "outcome",
        "./xmlData/event/eventOutcomeInformation/eventOutcome",
    ),
    (
        "detailnote",
        "./xmlData/event/eventOutcomeInformation/eventOutcomeDetail/eventOutcomeDetailNote",
    ),
];

/// Original files of the package.
pub const ORIGINAL_FILES: &str = ".//fileGrp[@USE='original']/file";

/// Every administrative section of the package.
pub const AMD_SECTIONS: &str = ".//amdSec";

/// PREMIS events inside an `amdSec`.
pub const PREMIS_EVENTS: &str = ".//digiprovMD/mdWrap[@MDTYPE='PREMIS:EVENT']";

/// A field table with its paths parsed.
pub type FieldPaths = Vec<(&'static str, ElementPath)>;

pub fn compile(fields: &[(&'static str, &str)]) -> Result<FieldPaths, ManifestError> {
    fields
        .iter()
        .map(|(field, path)| Ok((*field, ElementPath::parse(path)?)))
        .collect()
}

/// Resolves each `(field, path)` pair against `element`. Paths matching no
/// element, or an element without text, give an empty string.
pub fn extract(element: &Element, fields: &[(&'static str, ElementPath)]) -> RawFields {
    fields
        .iter()
        .map(|(field, path)| {
            let text = element
                .find(path)
                .map(|e| e.text().to_string())
                .unwrap_or_default();
            (*field, text)
        })
        .collect()
}
