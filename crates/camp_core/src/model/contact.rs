//! Contact domain model and upsert payload.
//!
//! # Responsibility
//! - Define the persisted contact read model.
//! - Define `NewContact`, the payload accepted by the upsert engine.
//!
//! # Invariants
//! - `email` is the sole identity key for "does this contact exist".
//! - Contacts are never updated after creation; only tags are added.
//! - Tag texts in a payload are kept exactly as supplied.

use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned contact identifier. Always positive once persisted.
pub type ContactId = i64;

/// Persisted contact row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub id: ContactId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    /// Store default `CURRENT_TIMESTAMP` (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Contact read-back including its linked tag texts, sorted by text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactWithTags {
    #[serde(flatten)]
    pub contact: Contact,
    pub tags: Vec<String>,
}

/// Inbound create-or-upsert payload.
///
/// Every field is optional on the wire so a tags-only upsert can omit the
/// names; a missing email decodes as `""` and fails `validate()`.
/// `tags` accepts plain strings (`["a"]`) as well as tag objects
/// (`[{"text": "a"}]`); `null` or a missing field means no tags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContact {
    #[serde(default, alias = "fname")]
    pub first_name: String,
    #[serde(default, alias = "lname")]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
}

/// Payload validation failures, raised before any store access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactValidationError {
    /// Email is missing or blank.
    EmptyEmail,
}

impl Display for ContactValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyEmail => write!(f, "email is required"),
        }
    }
}

impl Error for ContactValidationError {}

impl NewContact {
    /// Creates a payload without phone or tags.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: None,
            tags: Vec::new(),
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Returns whether the payload carries at least one tag.
    pub fn has_tags(&self) -> bool {
        !self.tags.is_empty()
    }

    /// Validates the payload shape.
    ///
    /// Only the email is checked. Tag texts, including `""`, are stored
    /// exactly as supplied.
    pub fn validate(&self) -> Result<(), ContactValidationError> {
        if self.email.trim().is_empty() {
            return Err(ContactValidationError::EmptyEmail);
        }

        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TagInput {
    Text(String),
    Object { text: String },
}

fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<TagInput>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|tag| match tag {
            TagInput::Text(text) | TagInput::Object { text } => text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{ContactValidationError, NewContact};

    #[test]
    fn validate_rejects_blank_email() {
        let payload = NewContact::new("John", "Doe", "   ");
        assert_eq!(payload.validate(), Err(ContactValidationError::EmptyEmail));
    }

    #[test]
    fn validate_accepts_empty_tag_text() {
        let payload = NewContact::new("John", "Doe", "john@x.com").with_tags(["a", ""]);
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn validate_keeps_whitespace_tags() {
        let payload = NewContact::new("John", "Doe", "john@x.com").with_tags([" a "]);
        assert!(payload.validate().is_ok());
        assert_eq!(payload.tags, vec![" a ".to_string()]);
    }
}
