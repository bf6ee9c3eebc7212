//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep request-handling layers decoupled from storage details.

pub mod contact_service;
