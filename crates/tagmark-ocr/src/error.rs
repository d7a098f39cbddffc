use thiserror::Error;

/// Errors raised while rasterizing pages or running a detection backend.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Failed to rasterize page {page}: {reason}")]
    Raster { page: usize, reason: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl DetectError {
    pub fn raster(page: usize, reason: impl Into<String>) -> Self {
        DetectError::Raster {
            page,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
