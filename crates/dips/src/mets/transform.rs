//! Normalization of raw manifest strings into typed record fields.

use chrono::{DateTime, Utc};

use super::extract::RawFields;
use crate::helpers::convert_size;
use crate::models::{DigitalFile, FieldErrors, PremisEvent};

const TRANSFER_DIRECTORY: &str = "%transferDirectory%";

fn field(raw: &RawFields, name: &str) -> String {
    raw.get(name).cloned().unwrap_or_default()
}

/// Typed values for a [`DigitalFile`], ready to merge over a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFields {
    pub uuid: String,
    pub filepath: String,
    pub fileformat: String,
    pub formatversion: String,
    /// `None` when `size_raw` is not an integer.
    pub size_bytes: Option<i64>,
    pub size_raw: String,
    pub size_human: String,
    pub datemodified: Option<DateTime<Utc>>,
    pub puid: String,
    pub amdsec: String,
    pub hashtype: String,
    pub hashvalue: String,
}

impl FileFields {
    pub fn from_raw(raw: &RawFields) -> Self {
        let size_raw = field(raw, "size_bytes");
        let size_bytes = size_raw.trim().parse::<i64>().ok();
        let size_human = size_bytes.map(convert_size).unwrap_or_default();

        Self {
            uuid: field(raw, "uuid"),
            filepath: field(raw, "filepath").replace(TRANSFER_DIRECTORY, ""),
            fileformat: field(raw, "fileformat"),
            formatversion: field(raw, "formatversion"),
            size_bytes,
            size_raw,
            size_human,
            datemodified: parse_epoch_millis(&field(raw, "datemodified")),
            puid: field(raw, "puid"),
            amdsec: field(raw, "amdsec"),
            hashtype: field(raw, "hashtype"),
            hashvalue: field(raw, "hashvalue"),
        }
    }

    /// Overwrites every field of `file` except its UUID and owner, then
    /// validates the result.
    pub fn merge_into(&self, file: &mut DigitalFile) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        file.filepath = self.filepath.clone();
        file.fileformat = self.fileformat.clone();
        file.formatversion = Some(self.formatversion.clone());
        match self.size_bytes {
            Some(size) => file.size_bytes = size,
            None => errors.not_an_integer("size_bytes", &self.size_raw),
        }
        file.size_human = self.size_human.clone();
        file.datemodified = self.datemodified;
        file.puid = self.puid.clone();
        file.amdsec = self.amdsec.clone();
        file.hashtype = self.hashtype.clone();
        file.hashvalue = self.hashvalue.clone();

        if let Err(more) = file.validate() {
            errors.extend(more);
        }
        errors.into_result()
    }
}

/// Typed values for a [`PremisEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFields {
    pub uuid: String,
    pub eventtype: String,
    pub datetime: String,
    pub detail: String,
    pub outcome: String,
    pub detailnote: String,
}

impl EventFields {
    pub fn from_raw(raw: &RawFields) -> Self {
        Self {
            uuid: field(raw, "uuid"),
            eventtype: field(raw, "eventtype"),
            datetime: field(raw, "datetime"),
            detail: field(raw, "detail"),
            outcome: field(raw, "outcome"),
            detailnote: field(raw, "detailnote"),
        }
    }

    pub fn merge_into(&self, event: &mut PremisEvent) -> Result<(), FieldErrors> {
        event.eventtype = self.eventtype.clone();
        event.datetime = self.datetime.clone();
        event.detail = Some(self.detail.clone());
        event.outcome = Some(self.outcome.clone());
        event.detailnote = Some(self.detailnote.clone());
        event.validate()
    }
}

/// Unix epoch milliseconds to a UTC instant; anything else is `None`.
pub fn parse_epoch_millis(raw: &str) -> Option<DateTime<Utc>> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(pairs: &[(&'static str, &str)]) -> RawFields {
        pairs.iter().map(|(k, v)| (*k, v.to_string())).collect()
    }

    #[test]
    fn test_filepath_and_size() {
        let fields = FileFields::from_raw(&raw(&[
            ("filepath", "%transferDirectory%objects/%transferDirectory%a.txt"),
            ("size_bytes", " 1536 "),
        ]));
        assert_eq!(fields.filepath, "objects/a.txt");
        assert_eq!(fields.size_bytes, Some(1536));
        assert_eq!(fields.size_human, "1.5 KB");

        let fields = FileFields::from_raw(&raw(&[("size_bytes", "0")]));
        assert_eq!(fields.size_human, "0 bytes");
    }

    #[test]
    fn test_datemodified_tolerance() {
        assert_eq!(
            parse_epoch_millis("1486094706000"),
            Some(Utc.with_ymd_and_hms(2017, 2, 3, 4, 5, 6).unwrap())
        );
        assert_eq!(parse_epoch_millis(""), None);
        assert_eq!(parse_epoch_millis("yesterday"), None);
        assert_eq!(parse_epoch_millis("99999999999999999"), None);
    }

    #[test]
    fn test_bad_size_is_a_validation_error() {
        let fields = FileFields::from_raw(&raw(&[
            ("uuid", "f1"),
            ("filepath", "objects/a.txt"),
            ("fileformat", "Plain Text"),
            ("amdsec", "amdSec_1"),
            ("hashtype", "md5"),
            ("hashvalue", "00"),
            ("size_bytes", "12kb"),
        ]));
        let mut file = DigitalFile::new("f1", 1);
        let errors = fields.merge_into(&mut file).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get("size_bytes").unwrap()[0],
            "\u{201c}12kb\u{201d} value must be an integer."
        );
    }

    #[test]
    fn test_merge_overwrites_existing_values() {
        let mut file = DigitalFile::new("f1", 1);
        file.puid = "fmt/18".into();
        file.hashtype = "md5".into();

        let fields = FileFields::from_raw(&raw(&[
            ("filepath", "objects/a.txt"),
            ("fileformat", "Plain Text"),
            ("amdsec", "amdSec_1"),
            ("hashtype", "sha256"),
            ("hashvalue", "00"),
            ("size_bytes", "10"),
        ]));
        fields.merge_into(&mut file).unwrap();
        assert_eq!(file.puid, "");
        assert_eq!(file.hashtype, "sha256");
        assert_eq!(file.size_human, "10 bytes");
        assert_eq!(file.formatversion.as_deref(), Some(""));
    }

    #[test]
    fn test_event_merge() {
        let fields = EventFields::from_raw(&raw(&[
            ("uuid", "e1"),
            ("eventtype", "message digest calculation"),
            ("outcome", "pass"),
        ]));
        let mut event = PremisEvent::new("e1", "f1");
        fields.merge_into(&mut event).unwrap();
        assert_eq!(event.eventtype, "message digest calculation");
        assert_eq!(event.outcome.as_deref(), Some("pass"));
        assert_eq!(event.detail.as_deref(), Some(""));
    }
}
