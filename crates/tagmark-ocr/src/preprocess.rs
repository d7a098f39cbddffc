//! Raster cleanup before detection: skew estimation and correction.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use tracing::debug;

/// Pixels at or below this luma value count as ink.
const INK_THRESHOLD: u8 = 128;

/// Estimates beyond this are page rotations, not scanner skew.
const MAX_SKEW_DEGREES: f64 = 45.0;

/// Below this many ink pixels the estimate is too unstable to act on.
const MIN_INK_PIXELS: usize = 32;

/// Skew smaller than this is left alone.
const SKEW_EPSILON_DEGREES: f64 = 0.1;

/// Estimates the page skew in degrees from the principal axis of the ink
/// pixel distribution. Positive values mean text lines slope downward to the
/// right. Returns 0.0 when the page is blank or the estimate falls outside
/// the scanner-skew range.
pub fn estimate_skew(image: &GrayImage) -> f64 {
    let mut count = 0usize;
    let (mut sum_x, mut sum_y) = (0.0f64, 0.0f64);
    let (mut sum_xx, mut sum_yy, mut sum_xy) = (0.0f64, 0.0f64, 0.0f64);

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel.0[0] <= INK_THRESHOLD {
            let (fx, fy) = (x as f64, y as f64);
            count += 1;
            sum_x += fx;
            sum_y += fy;
            sum_xx += fx * fx;
            sum_yy += fy * fy;
            sum_xy += fx * fy;
        }
    }
    if count < MIN_INK_PIXELS {
        return 0.0;
    }

    let n = count as f64;
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    let cov_xx = sum_xx / n - mean_x * mean_x;
    let cov_yy = sum_yy / n - mean_y * mean_y;
    let cov_xy = sum_xy / n - mean_x * mean_y;

    let degrees = (0.5 * (2.0 * cov_xy).atan2(cov_xx - cov_yy)).to_degrees();
    if !degrees.is_finite() || degrees.abs() > MAX_SKEW_DEGREES {
        return 0.0;
    }
    degrees
}

/// Straightens the page when a measurable skew is present. Returns the
/// corrected raster and the skew that was removed, in degrees.
///
/// The canvas keeps its size; uncovered pixels are filled white.
pub fn deskew(image: &GrayImage) -> (GrayImage, f64) {
    let angle = estimate_skew(image);
    if angle.abs() < SKEW_EPSILON_DEGREES {
        return (image.clone(), 0.0);
    }
    debug!(angle, "correcting skew");
    let fixed = rotate_about_center(
        image,
        (-angle).to_radians() as f32,
        Interpolation::Bilinear,
        Luma([255]),
    );
    (fixed, angle)
}
