//! Field-level validation shared by the persisted models.
//!
//! Messages follow the wording operators already know from the web UI so
//! that ingestion failures read the same wherever they surface.

use std::fmt;

/// Errors for a single field, in the order they were raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub messages: Vec<String>,
}

/// Aggregated per-field validation errors, kept in field declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: Vec<FieldError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field, grouping messages per field.
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        let message = message.into();
        match self.errors.iter_mut().find(|e| e.field == field) {
            Some(existing) => existing.messages.push(message),
            None => self.errors.push(FieldError {
                field,
                messages: vec![message],
            }),
        }
    }

    /// Appends every error of `other`.
    pub fn extend(&mut self, other: FieldErrors) {
        for error in other.errors {
            for message in error.messages {
                self.add(error.field, message);
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.errors.iter()
    }

    /// Returns the messages recorded for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.messages.as_slice())
    }

    /// Converts into a `Result`, `Ok` when nothing was recorded.
    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Rejects an empty value for a field that does not allow blanks.
    pub fn require(&mut self, field: &'static str, value: &str) {
        if value.is_empty() {
            self.add(field, "This field cannot be blank.");
        }
    }

    /// Rejects values longer than `max` characters.
    pub fn max_length(&mut self, field: &'static str, value: &str, max: usize) {
        let len = value.chars().count();
        if len > max {
            self.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max, len
                ),
            );
        }
    }

    /// Records a value that should have parsed as an integer.
    pub fn not_an_integer(&mut self, field: &'static str, raw: &str) {
        self.add(field, format!("\u{201c}{}\u{201d} value must be an integer.", raw));
    }
}

/// One bullet per invalid field: `- field: message message`.
impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {}: {}", error.field, error.messages.join(" "))?;
        }
        Ok(())
    }
}
