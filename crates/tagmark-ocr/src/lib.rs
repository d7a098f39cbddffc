//! Raster-side text detection for scanned documents.
//!
//! Documents without a usable text layer are rendered page by page, deskewed,
//! and run through a pluggable detection backend. The resulting fragments
//! feed the fuzzy matching pass in `tagmark-core` through its
//! `FragmentSource` seam.

pub mod detector;
pub mod error;
pub mod pipeline;
pub mod preprocess;

pub use detector::{global_detector, TextDetector};
pub use error::DetectError;
pub use pipeline::{detect_page, OcrPageSource, PageRasterizer, RenderedPage};
