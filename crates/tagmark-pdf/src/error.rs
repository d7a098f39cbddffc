use thiserror::Error;

/// Errors raised while parsing, stitching, or rewriting PDF documents.
#[derive(Error, Debug)]
pub enum PdfMarkError {
    #[error("Failed to parse PDF: {0}")]
    ParseError(String),

    #[error("Page {0} not found in document")]
    PageNotFound(usize),

    #[error("Malformed page tree: {0}")]
    PageTree(String),

    #[error("Failed to encode content stream: {0}")]
    ContentEncoding(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("No documents provided")]
    NoDocuments,

    #[error(transparent)]
    Run(#[from] tagmark_core::MarkError),
}

pub type Result<T> = std::result::Result<T, PdfMarkError>;
