//! Dublin Core descriptive metadata owned by a collection or a DIP.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::validation::FieldErrors;
use crate::db::{setting_repo, Database, DatabaseError};

/// Setting holding the optional fields shown to users.
pub const ENABLED_FIELDS_SETTING: &str = "enabled_optional_dc_fields";
/// Setting controlling whether empty fields are hidden from display.
pub const HIDE_EMPTY_SETTING: &str = "hide_empty_dc_fields";

/// The fifteen Dublin Core elements, minus `relation`, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcField {
    Identifier,
    Title,
    Creator,
    Subject,
    Description,
    Publisher,
    Contributor,
    Date,
    Type,
    Format,
    Source,
    Language,
    Coverage,
    Rights,
}

impl DcField {
    /// Every field, identifier first.
    pub const ALL: [DcField; 14] = [
        DcField::Identifier,
        DcField::Title,
        DcField::Creator,
        DcField::Subject,
        DcField::Description,
        DcField::Publisher,
        DcField::Contributor,
        DcField::Date,
        DcField::Type,
        DcField::Format,
        DcField::Source,
        DcField::Language,
        DcField::Coverage,
        DcField::Rights,
    ];

    /// Column and element name.
    pub fn name(self) -> &'static str {
        match self {
            DcField::Identifier => "identifier",
            DcField::Title => "title",
            DcField::Creator => "creator",
            DcField::Subject => "subject",
            DcField::Description => "description",
            DcField::Publisher => "publisher",
            DcField::Contributor => "contributor",
            DcField::Date => "date",
            DcField::Type => "type",
            DcField::Format => "format",
            DcField::Source => "source",
            DcField::Language => "language",
            DcField::Coverage => "coverage",
            DcField::Rights => "rights",
        }
    }

    /// Human readable label.
    pub fn label(self) -> &'static str {
        match self {
            DcField::Identifier => "Identifier",
            DcField::Title => "Title",
            DcField::Creator => "Creator",
            DcField::Subject => "Subject",
            DcField::Description => "Description",
            DcField::Publisher => "Publisher",
            DcField::Contributor => "Contributor",
            DcField::Date => "Date",
            DcField::Type => "Type",
            DcField::Format => "Format",
            DcField::Source => "Source",
            DcField::Language => "Language",
            DcField::Coverage => "Coverage",
            DcField::Rights => "Rights",
        }
    }

    /// Maximum length in characters, `None` for free text.
    pub fn max_length(self) -> Option<usize> {
        match self {
            DcField::Identifier => Some(50),
            DcField::Date => Some(21),
            DcField::Description | DcField::Format => None,
            _ => Some(200),
        }
    }

    /// Only the identifier is mandatory.
    pub fn is_optional(self) -> bool {
        self != DcField::Identifier
    }

    /// The optional fields, in display order.
    pub fn optional() -> impl Iterator<Item = DcField> {
        Self::ALL.into_iter().filter(|f| f.is_optional())
    }
}

impl FromStr for DcField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DcField::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown Dublin Core field '{}'", s))
    }
}

/// Values for the thirteen descriptive (optional) fields, always complete.
pub type DcValues = BTreeMap<DcField, String>;

/// Returns a `DcValues` map with every optional field set to empty.
pub fn empty_values() -> DcValues {
    DcField::optional().map(|f| (f, String::new())).collect()
}

/// A Dublin Core record.
///
/// `id` is 0 until the record has been inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DublinCore {
    pub id: i64,
    pub identifier: String,
    pub title: String,
    pub creator: String,
    pub subject: String,
    pub description: String,
    pub publisher: String,
    pub contributor: String,
    pub date: String,
    #[serde(rename = "type")]
    pub dc_type: String,
    pub format: String,
    pub source: String,
    pub language: String,
    pub coverage: String,
    pub rights: String,
}

impl DublinCore {
    /// Creates an unsaved record with only the identifier set.
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..Self::default()
        }
    }

    pub fn get(&self, field: DcField) -> &str {
        match field {
            DcField::Identifier => &self.identifier,
            DcField::Title => &self.title,
            DcField::Creator => &self.creator,
            DcField::Subject => &self.subject,
            DcField::Description => &self.description,
            DcField::Publisher => &self.publisher,
            DcField::Contributor => &self.contributor,
            DcField::Date => &self.date,
            DcField::Type => &self.dc_type,
            DcField::Format => &self.format,
            DcField::Source => &self.source,
            DcField::Language => &self.language,
            DcField::Coverage => &self.coverage,
            DcField::Rights => &self.rights,
        }
    }

    pub fn set(&mut self, field: DcField, value: impl Into<String>) {
        let value = value.into();
        match field {
            DcField::Identifier => self.identifier = value,
            DcField::Title => self.title = value,
            DcField::Creator => self.creator = value,
            DcField::Subject => self.subject = value,
            DcField::Description => self.description = value,
            DcField::Publisher => self.publisher = value,
            DcField::Contributor => self.contributor = value,
            DcField::Date => self.date = value,
            DcField::Type => self.dc_type = value,
            DcField::Format => self.format = value,
            DcField::Source => self.source = value,
            DcField::Language => self.language = value,
            DcField::Coverage => self.coverage = value,
            DcField::Rights => self.rights = value,
        }
    }

    /// Overwrites every descriptive field from `values`. The identifier is
    /// never touched.
    pub fn apply(&mut self, values: &DcValues) {
        for (field, value) in values {
            if field.is_optional() {
                self.set(*field, value.clone());
            }
        }
    }

    /// The descriptive fields and their current values.
    pub fn optional_fields(&self) -> Vec<(DcField, &str)> {
        DcField::optional().map(|f| (f, self.get(f))).collect()
    }

    /// Label/value pairs to show, honoring the display settings.
    pub fn display_data(&self, config: &DcDisplayConfig) -> Vec<(&'static str, String)> {
        DcField::ALL
            .into_iter()
            .filter(|f| !f.is_optional() || config.enabled_fields.contains(f))
            .filter(|f| !config.hide_empty || !self.get(*f).is_empty())
            .map(|f| (f.label(), self.get(f).to_string()))
            .collect()
    }

    /// Minimal JSON identification, `{identifier, title?}`.
    pub fn summary(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        add_if_not_empty(&mut map, "title", &self.title);
        map
    }

    /// The `dc` object embedded in collection and DIP index documents.
    pub fn inner_data(&self) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(self.identifier.clone()));
        add_if_not_empty(&mut map, "title", &self.title);
        add_if_not_empty(&mut map, "date", &self.date);
        add_if_not_empty(&mut map, "description", &self.description);
        map
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("identifier", &self.identifier);
        for field in DcField::ALL {
            if let Some(max) = field.max_length() {
                errors.max_length(field.name(), self.get(field), max);
            }
        }
        errors.into_result()
    }
}

/// Inserts `value` under `key` unless it is empty.
pub fn add_if_not_empty(map: &mut Map<String, Value>, key: &str, value: &str) {
    if !value.is_empty() {
        map.insert(key.to_string(), Value::String(value.to_string()));
    }
}

/// Which Dublin Core fields are shown to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DcDisplayConfig {
    pub enabled_fields: Vec<DcField>,
    pub hide_empty: bool,
}

impl Default for DcDisplayConfig {
    fn default() -> Self {
        Self {
            enabled_fields: DcField::optional().collect(),
            hide_empty: true,
        }
    }
}

impl DcDisplayConfig {
    /// Reads the display settings, falling back to defaults for missing
    /// entries. Unknown field names are ignored.
    pub fn load(db: &Database) -> Result<Self, DatabaseError> {
        let mut config = Self::default();

        if let Some(names) = setting_repo::get::<Vec<String>>(db, ENABLED_FIELDS_SETTING)? {
            config.enabled_fields = names
                .iter()
                .filter_map(|name| match name.parse::<DcField>() {
                    Ok(field) if field.is_optional() => Some(field),
                    _ => {
                        log::debug!("Ignoring unknown enabled DC field '{}'", name);
                        None
                    }
                })
                .collect();
        }
        if let Some(hide) = setting_repo::get::<bool>(db, HIDE_EMPTY_SETTING)? {
            config.hide_empty = hide;
        }

        Ok(config)
    }
}
