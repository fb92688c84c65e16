use serde::{Deserialize, Serialize};

use super::validation::FieldErrors;

/// A PREMIS preservation event recorded against a digital file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremisEvent {
    pub uuid: String,
    pub eventtype: String,
    pub datetime: String,
    pub detail: Option<String>,
    pub outcome: Option<String>,
    pub detailnote: Option<String>,
    pub digitalfile_uuid: String,
}

impl PremisEvent {
    pub fn new(uuid: impl Into<String>, digitalfile_uuid: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            eventtype: String::new(),
            datetime: String::new(),
            detail: None,
            outcome: None,
            detailnote: None,
            digitalfile_uuid: digitalfile_uuid.into(),
        }
    }

    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("uuid", &self.uuid);
        errors.max_length("uuid", &self.uuid, 36);
        errors.max_length("eventtype", &self.eventtype, 200);
        errors.max_length("datetime", &self.datetime, 50);
        errors.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut event = PremisEvent::new("e1", "f1");
        assert!(event.validate().is_ok());

        event.datetime = "2".repeat(51);
        let errors = event.validate().unwrap_err();
        assert_eq!(
            errors.get("datetime").unwrap(),
            &["Ensure this value has at most 50 characters (it has 51)."]
        );
    }
}
