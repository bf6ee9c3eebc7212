//! Runtime configuration resolved from the process environment.
//!
//! # Responsibility
//! - Resolve the SQLite database path and logging settings.
//! - Keep env lookup injectable so callers and tests do not mutate globals.
//!
//! # Invariants
//! - Blank values are treated as unset.
//! - Resolution never fails; invalid log levels surface later from
//!   `init_logging`.

use crate::logging::default_log_level;
use std::path::PathBuf;

pub const DB_PATH_ENV: &str = "CAMP_DB_PATH";
pub const LOG_LEVEL_ENV: &str = "CAMP_LOG_LEVEL";
pub const LOG_DIR_ENV: &str = "CAMP_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "camp.sqlite3";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Default filter for the rolling logger, e.g. `info`.
    pub log_level: String,
    /// Rolling log directory. Logging stays off when `None`.
    pub log_dir: Option<PathBuf>,
}

impl CampConfig {
    /// Resolves configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolves configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            db_path: non_blank(DB_PATH_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level: non_blank(LOG_LEVEL_ENV)
                .unwrap_or_else(|| default_log_level().to_string()),
            log_dir: non_blank(LOG_DIR_ENV).map(PathBuf::from),
        }
    }

    /// Replaces the database path, e.g. with a command-line override.
    pub fn with_db_path(mut self, db_path: impl Into<PathBuf>) -> Self {
        self.db_path = db_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{CampConfig, DB_PATH_ENV, LOG_DIR_ENV, LOG_LEVEL_ENV};
    use crate::logging::default_log_level;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config_from(pairs: &[(&str, &str)]) -> CampConfig {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        CampConfig::from_lookup(|key| values.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.db_path, std::env::temp_dir().join("camp.sqlite3"));
        assert_eq!(config.log_level, default_log_level());
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn explicit_values_are_trimmed_and_blank_values_ignored() {
        let config = config_from(&[
            (DB_PATH_ENV, " /var/lib/camp/contacts.db "),
            (LOG_LEVEL_ENV, "warn"),
            (LOG_DIR_ENV, "   "),
        ]);
        assert_eq!(config.db_path, PathBuf::from("/var/lib/camp/contacts.db"));
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.log_dir, None);
    }

    #[test]
    fn log_dir_resolves_to_a_path() {
        let config = config_from(&[(LOG_DIR_ENV, "/var/log/camp")]);
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/camp")));
    }

    #[test]
    fn db_path_override_wins() {
        let config = config_from(&[(DB_PATH_ENV, "/tmp/a.db")]).with_db_path("/tmp/b.db");
        assert_eq!(config.db_path, PathBuf::from("/tmp/b.db"));
    }
}
