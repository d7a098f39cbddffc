//! The detection backend seam.

use image::DynamicImage;
use once_cell::sync::OnceCell;

use tagmark_core::TextFragment;

use crate::error::Result;

/// A text detection backend.
///
/// Implementations return fragments in raster pixel coordinates with the
/// origin at the top-left corner, confidence in `0.0..=1.0`. The pipeline
/// handles confidence gating and the mapping into page space.
pub trait TextDetector: Send + Sync {
    fn name(&self) -> &'static str;

    fn detect(&self, image: &DynamicImage) -> Result<Vec<TextFragment>>;
}

static DETECTOR: OnceCell<Box<dyn TextDetector>> = OnceCell::new();

/// Returns the process-wide detector, installing it on first use.
///
/// Detection backends load models and are expensive to bring up, so one
/// instance is shared for the lifetime of the process; later `init` closures
/// are ignored.
pub fn global_detector<F>(init: F) -> &'static dyn TextDetector
where
    F: FnOnce() -> Box<dyn TextDetector>,
{
    DETECTOR.get_or_init(init).as_ref()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Named(&'static str);

    impl TextDetector for Named {
        fn name(&self) -> &'static str {
            self.0
        }

        fn detect(&self, _image: &DynamicImage) -> Result<Vec<TextFragment>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_first_installed_detector_wins() {
        let first = global_detector(|| Box::new(Named("first")));
        assert_eq!(first.name(), "first");
        let second = global_detector(|| Box::new(Named("second")));
        assert_eq!(second.name(), "first");
    }
}
