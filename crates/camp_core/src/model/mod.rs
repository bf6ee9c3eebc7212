//! Domain model for contacts and their tags.
//!
//! # Responsibility
//! - Define the records read from and written to the contacts store.
//! - Define the inbound upsert payload and its validation rules.
//!
//! # Invariants
//! - A contact is identified by its email; the numeric id is store-assigned.
//! - Tag text is an exact, case-sensitive label shared across contacts.

pub mod contact;
pub mod tag;
