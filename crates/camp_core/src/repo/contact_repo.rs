//! Contact/tag repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own the create-or-upsert reconciliation for contacts and their tags.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - One upsert call runs in exactly one IMMEDIATE transaction; a failure at
//!   any step rolls back every write of that call.
//! - Tag rows and `contact_tag` links are inserted with ignore-on-conflict
//!   semantics, so re-sending the same tags is a no-op.
//! - An existing contact is never modified; only links are added.
//! - A unique-constraint failure on `contacts.email` surfaces as
//!   `RepoError::DuplicateEmail`, never as a raw store error.

use crate::db::DbError;
use crate::model::contact::{
    Contact, ContactId, ContactValidationError, ContactWithTags, NewContact,
};
use crate::model::tag::{Tag, TagId};
use rusqlite::{
    ffi, params, Connection, ErrorCode, OptionalExtension, Row, Transaction, TransactionBehavior,
};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

const CONTACT_SELECT_SQL: &str = "SELECT
    id,
    fname,
    lname,
    email,
    phone,
    created_at,
    updated_at
FROM contacts";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for contact persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ContactValidationError),
    Db(DbError),
    /// Email already registered and the payload carried no tags, or a
    /// concurrent writer created the same email first.
    DuplicateEmail,
    InvalidData(String),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid contact payload: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateEmail => write!(f, "email already exists"),
            Self::InvalidData(message) => write!(f, "invalid persisted contact data: {message}"),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ContactValidationError> for RepoError {
    fn from(value: ContactValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of one create-or-upsert call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    /// Resolved contact id: the new row, or the pre-existing one.
    pub contact_id: ContactId,
    /// `true` when a contact row was inserted by this call.
    pub created: bool,
    /// Number of `contact_tag` rows inserted by this call.
    pub tags_linked: usize,
}

/// Repository interface for contact/tag operations.
pub trait ContactRepository {
    /// Inserts a new contact or attaches tags to the existing one with the
    /// same email, in one transaction.
    fn create_or_upsert_tags(&mut self, contact: &NewContact) -> RepoResult<UpsertOutcome>;
    /// Gets one contact by exact email match.
    fn get_by_email(&self, email: &str) -> RepoResult<Option<Contact>>;
    /// Gets one contact with its tag texts.
    fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactWithTags>>;
    /// Lists tags linked to one contact, sorted by text.
    fn list_contact_tags(&self, id: ContactId) -> RepoResult<Vec<Tag>>;
}

/// SQLite-backed contact repository.
pub struct SqliteContactRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteContactRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_contact_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl ContactRepository for SqliteContactRepository<'_> {
    fn create_or_upsert_tags(&mut self, contact: &NewContact) -> RepoResult<UpsertOutcome> {
        contact.validate()?;

        // Dropping `tx` on any early return rolls the whole call back.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let outcome = match find_contact_id_by_email(&tx, &contact.email)? {
            Some(_) if !contact.has_tags() => return Err(RepoError::DuplicateEmail),
            Some(existing_id) => {
                let tag_ids = materialize_tags(&tx, &contact.tags)?;
                let tags_linked = link_tags_to_contact(&tx, existing_id, &tag_ids)?;
                UpsertOutcome {
                    contact_id: existing_id,
                    created: false,
                    tags_linked,
                }
            }
            None => {
                let contact_id = insert_contact(&tx, contact)?;
                let mut tags_linked = 0;
                if contact.has_tags() {
                    let tag_ids = materialize_tags(&tx, &contact.tags)?;
                    tags_linked = link_tags_to_contact(&tx, contact_id, &tag_ids)?;
                }
                UpsertOutcome {
                    contact_id,
                    created: true,
                    tags_linked,
                }
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get_by_email(&self, email: &str) -> RepoResult<Option<Contact>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}
             WHERE email = ?1
             LIMIT 1;"
        ))?;

        let mut rows = stmt.query([email])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_contact_row(row)?));
        }

        Ok(None)
    }

    fn get_contact(&self, id: ContactId) -> RepoResult<Option<ContactWithTags>> {
        let mut stmt = self.conn.prepare(&format!(
            "{CONTACT_SELECT_SQL}
             WHERE id = ?1;"
        ))?;

        let mut rows = stmt.query([id])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };
        let contact = parse_contact_row(row)?;
        let tags = self
            .list_contact_tags(contact.id)?
            .into_iter()
            .map(|tag| tag.text)
            .collect();

        Ok(Some(ContactWithTags { contact, tags }))
    }

    fn list_contact_tags(&self, id: ContactId) -> RepoResult<Vec<Tag>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                t.id,
                t.text,
                t.created_at,
                t.updated_at
             FROM contact_tag ct
             INNER JOIN tags t ON t.id = ct.tag_id
             WHERE ct.contact_id = ?1
             ORDER BY t.text ASC;",
        )?;

        let mut rows = stmt.query([id])?;
        let mut tags = Vec::new();
        while let Some(row) = rows.next()? {
            tags.push(Tag {
                id: row.get("id")?,
                text: row.get("text")?,
                created_at: row.get("created_at")?,
                updated_at: row.get("updated_at")?,
            });
        }

        Ok(tags)
    }
}

fn find_contact_id_by_email(tx: &Transaction<'_>, email: &str) -> RepoResult<Option<ContactId>> {
    let id = tx
        .query_row(
            "SELECT id FROM contacts WHERE email = ?1 LIMIT 1;",
            [email],
            |row| row.get(0),
        )
        .optional()?;
    Ok(id)
}

/// Inserts missing tag rows and resolves every distinct text to its id.
///
/// Ids are returned in first-seen order of the input texts.
fn materialize_tags(tx: &Transaction<'_>, texts: &[String]) -> RepoResult<Vec<TagId>> {
    let mut insert = tx.prepare_cached("INSERT OR IGNORE INTO tags (text) VALUES (?1);")?;
    let mut select = tx.prepare_cached("SELECT id FROM tags WHERE text = ?1;")?;

    let mut seen = BTreeSet::new();
    let mut tag_ids = Vec::with_capacity(texts.len());
    for text in texts {
        if !seen.insert(text.as_str()) {
            continue;
        }

        insert.execute([text])?;
        let tag_id: TagId = select
            .query_row([text], |row| row.get(0))
            .optional()?
            .ok_or_else(|| RepoError::InvalidData(format!("tag `{text}` missing after insert")))?;
        tag_ids.push(tag_id);
    }

    Ok(tag_ids)
}

fn link_tags_to_contact(
    tx: &Transaction<'_>,
    contact_id: ContactId,
    tag_ids: &[TagId],
) -> RepoResult<usize> {
    let mut link = tx.prepare_cached(
        "INSERT OR IGNORE INTO contact_tag (contact_id, tag_id) VALUES (?1, ?2);",
    )?;

    let mut linked = 0;
    for tag_id in tag_ids {
        linked += link.execute(params![contact_id, tag_id])?;
    }

    Ok(linked)
}

fn insert_contact(tx: &Transaction<'_>, contact: &NewContact) -> RepoResult<ContactId> {
    let result = tx.execute(
        "INSERT INTO contacts (fname, lname, email, phone)
         VALUES (?1, ?2, ?3, ?4);",
        params![
            contact.first_name.as_str(),
            contact.last_name.as_str(),
            contact.email.as_str(),
            contact.phone.as_deref(),
        ],
    );

    match result {
        Ok(_) => Ok(tx.last_insert_rowid()),
        Err(err) if is_unique_violation(&err) => Err(RepoError::DuplicateEmail),
        Err(err) => Err(err.into()),
    }
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

fn parse_contact_row(row: &Row<'_>) -> RepoResult<Contact> {
    let id: ContactId = row.get("id")?;
    if id <= 0 {
        return Err(RepoError::InvalidData(format!(
            "invalid id value `{id}` in contacts.id"
        )));
    }

    Ok(Contact {
        id,
        first_name: row.get("fname")?,
        last_name: row.get("lname")?,
        email: row.get("email")?,
        phone: row.get("phone")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn ensure_contact_connection_ready(conn: &Connection) -> RepoResult<()> {
    let required: [(&'static str, &[&'static str]); 3] = [
        ("contacts", &["id", "fname", "lname", "email", "phone"]),
        ("tags", &["id", "text"]),
        ("contact_tag", &["contact_id", "tag_id"]),
    ];

    for (table, columns) in required {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for &column in columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
