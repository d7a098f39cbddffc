//! Tag locating and reconciliation over PDF text layers and OCR fragments.
//!
//! The engine takes an ordered tag list and a document, decides per page
//! which tags are present (literal search, structural regex prescan, or
//! fuzzy OCR matching), has the document collaborator draw a stroked
//! rectangle over each locatable occurrence, and reconciles everything into
//! a found/not-found partition plus a trailing report page.
//!
//! Document access, rasterization and OCR are collaborator traits in
//! [`source`]; this crate contains no PDF or image code.

pub mod error;
pub mod report;
pub mod source;
pub mod strategy;
pub mod strictness;
pub mod tags;
pub mod types;

pub mod run;

pub use error::{MarkError, SourceError};
pub use report::ReportPolicy;
pub use run::{run_ocr, run_text_layer, MarkOptions, RunSummary};
pub use source::{Annotator, FragmentSource, TextSource};
pub use strategy::{MatchStrategy, OcrFuzzy, PageObservation, TextLayerExact, TextLayerStructural};
pub use strictness::StrictnessLevel;
pub use tags::{TagLedger, TagSheet, DEFAULT_TAG_COLUMN};
pub use types::{Point, Quad, Region, Rgb, TextFragment, MIN_CONFIDENCE};
