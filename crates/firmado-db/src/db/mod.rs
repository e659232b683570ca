//! Database repositories for data access layer
//!
//! Each repository owns a single domain entity and provides CRUD operations
//! plus the specialized conditional updates the signing flow relies on.
//
// Document records and the at-most-one-signature update
pub mod document;
//
// In-memory implementation for tests and local development
pub mod memory;

pub use document::{DocumentRepository, PgDocumentRepository};
pub use memory::InMemoryDocumentRepository;
