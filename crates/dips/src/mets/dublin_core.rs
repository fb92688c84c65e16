//! Selection of the package-level Dublin Core block.
//!
//! A METS file may carry several DC `dmdSec`s for the package, one per
//! metadata update. The authoritative one is the most recently `CREATED`
//! section among those referenced by the `objects` directory div.

use super::error::ManifestError;
use super::xml::Element;
use crate::models::{empty_values, DcField, DcValues};

const DC_SECTIONS: &str = "dmdSec";
const DC_WRAP: &str = "mdWrap[@MDTYPE='DC']";
const OBJECTS_DIV: &str = "structMap/div/div[@TYPE='Directory'][@LABEL='objects']";
const DC_RECORD: &str = "mdWrap/xmlData/dublincore";

/// Returns the descriptive fields of the package, or `None` when the
/// manifest carries no usable package-level block.
pub fn resolve(root: &Element) -> Result<Option<DcValues>, ManifestError> {
    let mut sections = Vec::new();
    for dmd in root.select(DC_SECTIONS)? {
        if dmd.select_one(DC_WRAP)?.is_some() {
            sections.push(dmd);
        }
    }
    if sections.is_empty() {
        return Ok(None);
    }

    let dmdids: Vec<&str> = match root
        .select_one(OBJECTS_DIV)?
        .and_then(|div| div.attr("DMDID"))
    {
        Some(ids) => ids.split_whitespace().collect(),
        None => return Ok(None),
    };

    // Stable sort, so equal timestamps keep document order and the last
    // one wins. Sections without CREATED sort first.
    sections.retain(|dmd| dmd.attr("ID").is_some_and(|id| dmdids.contains(&id)));
    sections.sort_by(|a, b| a.attr("CREATED").cmp(&b.attr("CREATED")));

    let record = match sections.last() {
        Some(dmd) => dmd.select_one(DC_RECORD)?,
        None => None,
    };
    let Some(record) = record else {
        return Ok(None);
    };

    let mut values = empty_values();
    for element in &record.children {
        let Ok(field) = element.name.parse::<DcField>() else {
            continue;
        };
        if field.is_optional() && !element.text().is_empty() {
            values.insert(field, element.text().to_string());
        }
    }

    Ok(Some(values))
}
