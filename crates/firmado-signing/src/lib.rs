//! Firmado Signing Library
//!
//! This crate implements the document signing pipeline: DOCX to PDF conversion
//! through a headless office process, visual stamping of every page, and
//! detached CMS digital signatures embedded as PDF incremental updates.
//!
//! The [`pipeline::SigningPipeline`] orchestrates one signing attempt end to
//! end against the storage and repository abstractions. The leaf modules
//! (`converter`, `stamper`, `signer`, `keystore`) are independent of each
//! other and return [`error::SigningError`] values that map onto the
//! application error taxonomy.

pub(crate) mod byte_range;
pub mod converter;
pub mod error;
pub mod keystore;
pub mod naming;
pub mod pipeline;
pub mod signer;
pub mod stamper;
pub mod validator;

#[cfg(test)]
pub(crate) mod pdf_fixtures;

// Re-export commonly used types
pub use converter::{Converter, SofficeConverter};
pub use error::{SigningError, SigningResult};
pub use keystore::{load_signing_key, SigningKey};
pub use pipeline::SigningPipeline;
pub use validator::{DocumentValidator, ValidationError};
