//! Tag domain model.
//!
//! # Invariants
//! - `text` is unique across the store and never normalized.
//! - Tags are created lazily and never deleted.

use serde::Serialize;

/// Store-assigned tag identifier.
pub type TagId = i64;

/// Persisted tag row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: TagId,
    /// Exact label, e.g. `purchase:golang`.
    pub text: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}
