// src/error.rs
use folio_pdf_composer::ComposerError;
use folio_text_layer::TextLayerError;
use folio_types::InvalidToken;
use std::path::PathBuf;
use thiserror::Error;

/// A comprehensive error type for the TOC post-processing pipeline.
#[derive(Error, Debug)]
pub enum TocError {
    #[error("Input document not found: {}", .0.display())]
    InputNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Text extraction failed: {0}")]
    TextLayer(#[from] TextLayerError),

    #[error("Page composition failed: {0}")]
    Composer(#[from] ComposerError),

    #[error(transparent)]
    InvalidToken(#[from] InvalidToken),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for TocError {
    fn from(e: serde_json::Error) -> Self {
        TocError::Config(format!("Report serialization failed: {}", e))
    }
}
