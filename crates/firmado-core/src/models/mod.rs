pub mod document;

pub use document::{
    Document, DocumentResponse, KeyMaterial, SigningMode, DOCX_CONTENT_TYPE, PDF_CONTENT_TYPE,
};
