use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextLayerError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Text extraction error: {0}")]
    Output(#[from] pdf_extract::OutputError),

    #[error("Page {0} does not exist")]
    MissingPage(usize),

    #[error("Could not extract text from page {page}: {reason}")]
    Extraction { page: usize, reason: String },
}
