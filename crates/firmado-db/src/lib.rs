//! Firmado Database Library
//!
//! Repository layer over PostgreSQL. The [`db::DocumentRepository`] trait
//! abstracts persistence so the signing pipeline and the API handlers never
//! see SQL; [`db::PgDocumentRepository`] is the production implementation and
//! [`db::InMemoryDocumentRepository`] backs tests and local tooling.

pub mod db;

// Re-export commonly used types
pub use db::{DocumentRepository, InMemoryDocumentRepository, PgDocumentRepository};
