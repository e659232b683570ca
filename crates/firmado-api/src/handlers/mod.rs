//! HTTP request handlers.

pub mod document_delete;
pub mod document_download;
pub mod document_get;
pub mod document_sign;
pub mod document_signed;
pub mod document_upload;
pub mod health;
