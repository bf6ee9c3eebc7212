//! Contact use-case service.
//!
//! # Responsibility
//! - Provide the create-or-upsert entry point for request-handling callers.
//! - Translate repository failures into caller-facing error kinds.
//! - Emit metadata-only `contact_upsert` diagnostics.
//!
//! # Invariants
//! - Malformed payloads are rejected by the repository before its
//!   transaction opens and surface here as `MalformedInput`.
//! - Logs never carry email, names, phone or tag texts.
//! - No retries; every failure is returned to the caller as-is.

use crate::model::contact::{
    Contact, ContactId, ContactValidationError, ContactWithTags, NewContact,
};
use crate::repo::contact_repo::{ContactRepository, RepoError, RepoResult};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for contact use-cases.
#[derive(Debug)]
pub enum ContactServiceError {
    /// Payload failed validation; nothing was read or written.
    MalformedInput(ContactValidationError),
    /// Email already exists and no tags were supplied, or a concurrent
    /// request registered the same email first.
    DuplicateEmail,
    /// Persistence-layer failure; the transaction was rolled back.
    Repo(RepoError),
}

impl Display for ContactServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedInput(err) => write!(f, "invalid contact payload: {err}"),
            Self::DuplicateEmail => write!(f, "email already exists"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ContactServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::MalformedInput(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::DuplicateEmail => None,
        }
    }
}

impl From<RepoError> for ContactServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::MalformedInput(err),
            RepoError::DuplicateEmail => Self::DuplicateEmail,
            other => Self::Repo(other),
        }
    }
}

impl ContactServiceError {
    /// Stable machine-readable code for logs and response envelopes.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedInput(_) => "malformed_input",
            Self::DuplicateEmail => "duplicate_email",
            Self::Repo(_) => "store_error",
        }
    }

    /// Returns whether the caller can fix the request and resubmit.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::MalformedInput(_) | Self::DuplicateEmail)
    }
}

/// Contact service facade over repository implementations.
pub struct ContactService<R: ContactRepository> {
    repo: R,
}

impl<R: ContactRepository> ContactService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Creates a contact, or attaches tags to the contact owning the email.
    ///
    /// # Contract
    /// - New email: contact inserted (with or without tags), new id returned.
    /// - Existing email with tags: tags linked, existing id returned.
    /// - Existing email without tags: `DuplicateEmail`, nothing written.
    /// - Blank email: `MalformedInput`, nothing read or written.
    pub fn create_or_upsert_tags(
        &mut self,
        contact: &NewContact,
    ) -> Result<ContactId, ContactServiceError> {
        let started_at = Instant::now();
        match self.repo.create_or_upsert_tags(contact) {
            Ok(outcome) => {
                info!(
                    "event=contact_upsert module=contact status=ok outcome={} contact_id={} tags_requested={} tags_linked={} duration_ms={}",
                    if outcome.created { "created" } else { "tags_upserted" },
                    outcome.contact_id,
                    contact.tags.len(),
                    outcome.tags_linked,
                    started_at.elapsed().as_millis()
                );
                Ok(outcome.contact_id)
            }
            Err(err) => {
                let err = ContactServiceError::from(err);
                log_rejected(&err, started_at);
                Err(err)
            }
        }
    }

    /// Gets one contact with its tags by id.
    pub fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactWithTags>> {
        self.repo.get_contact(id)
    }

    /// Gets one contact by exact email match.
    pub fn get_by_email(&self, email: &str) -> RepoResult<Option<Contact>> {
        self.repo.get_by_email(email)
    }
}

fn log_rejected(err: &ContactServiceError, started_at: Instant) {
    let status = if err.is_client_error() {
        "rejected"
    } else {
        "error"
    };
    warn!(
        "event=contact_upsert module=contact status={} error_code={} duration_ms={}",
        status,
        err.code(),
        started_at.elapsed().as_millis()
    );
}

#[cfg(test)]
mod tests {
    use super::ContactServiceError;
    use crate::db::DbError;
    use crate::model::contact::ContactValidationError;
    use crate::repo::contact_repo::RepoError;

    #[test]
    fn repo_errors_map_to_caller_facing_kinds() {
        let duplicate = ContactServiceError::from(RepoError::DuplicateEmail);
        assert!(matches!(duplicate, ContactServiceError::DuplicateEmail));
        assert!(duplicate.is_client_error());

        let malformed =
            ContactServiceError::from(RepoError::Validation(ContactValidationError::EmptyEmail));
        assert!(matches!(
            malformed,
            ContactServiceError::MalformedInput(ContactValidationError::EmptyEmail)
        ));

        let store = ContactServiceError::from(RepoError::Db(DbError::Sqlite(
            rusqlite::Error::InvalidQuery,
        )));
        assert_eq!(store.code(), "store_error");
        assert!(!store.is_client_error());
    }

    #[test]
    fn duplicate_email_message_is_human_readable() {
        assert_eq!(
            ContactServiceError::DuplicateEmail.to_string(),
            "email already exists"
        );
    }
}
