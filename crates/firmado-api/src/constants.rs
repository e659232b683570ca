//! API constants
//!
//! All document routes are mounted under [`API_PREFIX`].

/// API base path prefix
pub const API_PREFIX: &str = "/api";
