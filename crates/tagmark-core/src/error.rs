use thiserror::Error;

/// Fatal, run-aborting failures.
#[derive(Error, Debug)]
pub enum MarkError {
    #[error("Unknown strictness level: {0}")]
    UnknownStrictness(String),

    #[error("Tag column '{0}' not found in sheet")]
    TagColumnMissing(String),

    #[error("Failed to access page {page}: {reason}")]
    PageAccess { page: usize, reason: String },

    #[error("Document operation failed: {0}")]
    Document(String),
}

/// Failures reported by collaborators across the trait boundary.
///
/// Page-level failures abort the run; annotation failures are recovered
/// locally by the run driver and reflected in the summary counters.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Page {page} unavailable: {reason}")]
    Page { page: usize, reason: String },

    #[error("Annotation rejected: {0}")]
    Annotation(String),
}

impl SourceError {
    pub fn page(page: usize, reason: impl Into<String>) -> Self {
        SourceError::Page {
            page,
            reason: reason.into(),
        }
    }

    pub fn annotation(reason: impl Into<String>) -> Self {
        SourceError::Annotation(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, MarkError>;
