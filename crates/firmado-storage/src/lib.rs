//! Firmado Storage Library
//!
//! This crate provides the blob store abstraction for Firmado and its local
//! filesystem implementation. Uploaded documents and signed artifacts are
//! stored as opaque blobs addressed by a storage key.
//!
//! # Storage key format
//!
//! Keys are flat (no directory separators): `{uuid}_{sanitized_filename}`.
//! The random prefix makes keys unique even when two users upload files with
//! the same name. Keys must not contain `/` or `..`. Key generation is
//! centralized in the `keys` module so every write path stays consistent.

pub(crate) mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
