//! Core contact-management data layer for Camp.
//! This crate owns the contact/tag schema and the create-or-upsert rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CampConfig;
pub use logging::{default_log_level, init_logging, LoggingError};
pub use model::contact::{
    Contact, ContactId, ContactValidationError, ContactWithTags, NewContact,
};
pub use model::tag::{Tag, TagId};
pub use repo::contact_repo::{
    ContactRepository, RepoError, RepoResult, SqliteContactRepository, UpsertOutcome,
};
pub use service::contact_service::{ContactService, ContactServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
