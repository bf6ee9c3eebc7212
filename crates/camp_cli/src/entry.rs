//! Single-payload create-or-upsert flow used by the binary.
//!
//! # Invariants
//! - Never panics; every failure becomes a `{"message": ...}` envelope.
//! - Success envelopes carry the resolved contact id as `{"id": n}`.

use camp_core::db::open_db;
use camp_core::{CampConfig, ContactService, NewContact, SqliteContactRepository};
use log::error;
use serde::Serialize;

/// Response envelope printed to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EntryResponse {
    Created { id: i64 },
    Failed { message: String },
}

impl EntryResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Created { .. })
    }
}

/// Decodes `input` and resolves it against the configured database.
pub fn run_entry(config: &CampConfig, input: &str) -> EntryResponse {
    let payload: NewContact = match serde_json::from_str(input) {
        Ok(payload) => payload,
        Err(err) => {
            error!("event=entry_decode module=cli status=error error={err}");
            return EntryResponse::failure("invalid json");
        }
    };

    let mut conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => return EntryResponse::failure(format!("database open failed: {err}")),
    };
    let repo = match SqliteContactRepository::try_new(&mut conn) {
        Ok(repo) => repo,
        Err(err) => return EntryResponse::failure(format!("repository init failed: {err}")),
    };

    let mut service = ContactService::new(repo);
    match service.create_or_upsert_tags(&payload) {
        Ok(id) => EntryResponse::Created { id },
        Err(err) => EntryResponse::failure(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::{run_entry, EntryResponse};
    use camp_core::CampConfig;
    use std::path::Path;

    fn config_for(path: &Path) -> CampConfig {
        CampConfig::from_lookup(|_| None).with_db_path(path)
    }

    #[test]
    fn create_then_tag_then_reject_bare_resubmission() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("entry.db"));

        let created = run_entry(
            &config,
            r#"{"first_name":"John","last_name":"Doe","email":"john@x.com","tags":["a","b"]}"#,
        );
        let EntryResponse::Created { id } = created else {
            panic!("expected created response, got {created:?}");
        };
        assert!(id > 0);

        let tagged = run_entry(
            &config,
            r#"{"first_name":"John","last_name":"Doe","email":"john@x.com","tags":[{"text":"c"}]}"#,
        );
        assert_eq!(tagged, EntryResponse::Created { id });

        let rejected = run_entry(
            &config,
            r#"{"first_name":"John","last_name":"Doe","email":"john@x.com"}"#,
        );
        assert_eq!(rejected, EntryResponse::failure("email already exists"));
    }

    #[test]
    fn tags_only_payload_without_names_reaches_existing_contact() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("entry.db"));

        let created = run_entry(
            &config,
            r#"{"first_name":"John","last_name":"Doe","email":"j@x.com","tags":["a"]}"#,
        );
        let EntryResponse::Created { id } = created else {
            panic!("expected created response, got {created:?}");
        };

        let tagged = run_entry(&config, r#"{"email":"j@x.com","tags":["b"]}"#);
        assert_eq!(tagged, EntryResponse::Created { id });
    }

    #[test]
    fn missing_email_is_reported_as_invalid_payload() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("entry.db"));

        let response = run_entry(&config, r#"{"first_name":"John","last_name":"Doe"}"#);
        assert_eq!(
            response,
            EntryResponse::failure("invalid contact payload: email is required")
        );
    }

    #[test]
    fn empty_tag_text_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(&dir.path().join("entry.db"));

        let response = run_entry(
            &config,
            r#"{"first_name":"K","last_name":"D","email":"k@x.com","tags":[""]}"#,
        );
        assert!(response.is_success(), "{response:?}");
    }

    #[test]
    fn malformed_json_is_reported_without_touching_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("untouched.db");

        let response = run_entry(&config_for(&path), "{not json");
        assert_eq!(response, EntryResponse::failure("invalid json"));
        assert!(!path.exists());
    }

    #[test]
    fn envelopes_serialize_to_wire_shape() {
        let created = serde_json::to_string(&EntryResponse::Created { id: 3 }).unwrap();
        assert_eq!(created, r#"{"id":3}"#);

        let failed = serde_json::to_string(&EntryResponse::failure("email already exists")).unwrap();
        assert_eq!(failed, r#"{"message":"email already exists"}"#);
    }
}
