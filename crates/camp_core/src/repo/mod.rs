//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for contacts and tags.
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes must enforce `NewContact::validate()` before persistence.
//! - Repository APIs return semantic errors (`DuplicateEmail`) in addition to
//!   DB transport errors.

pub mod contact_repo;
