use lopdf::ObjectId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ComposerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Content of page {0:?} could not be decoded: {1}")]
    UndecodableContent(ObjectId, String),

    #[error("{0}")]
    Other(String),
}
