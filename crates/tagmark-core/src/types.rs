use serde::{Deserialize, Serialize};

/// Fragments below this confidence never take part in matching.
pub const MIN_CONFIDENCE: f32 = 0.4;

/// Axis-aligned rectangle in page coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Region {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Region { x0, y0, x1, y1 }
    }

    /// Grows the rectangle outward by `margin` on every side.
    pub fn expand(&self, margin: f64) -> Region {
        Region {
            x0: self.x0 - margin,
            y0: self.y0 - margin,
            x1: self.x1 + margin,
            y1: self.y1 + margin,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Finite coordinates with positive area.
    pub fn is_valid(&self) -> bool {
        let finite = [self.x0, self.y0, self.x1, self.y1]
            .iter()
            .all(|v| v.is_finite());
        finite && self.x1 > self.x0 && self.y1 > self.y0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// Corner-ordered quadrilateral as text detectors report them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quad {
    pub points: [Point; 4],
}

impl Quad {
    pub fn new(points: [Point; 4]) -> Self {
        Quad { points }
    }

    /// Axis-aligned quad spanning `region`, corners clockwise from top-left.
    pub fn from_region(region: Region) -> Self {
        Quad {
            points: [
                Point {
                    x: region.x0,
                    y: region.y0,
                },
                Point {
                    x: region.x1,
                    y: region.y0,
                },
                Point {
                    x: region.x1,
                    y: region.y1,
                },
                Point {
                    x: region.x0,
                    y: region.y1,
                },
            ],
        }
    }

    /// Bounding rectangle over all four corners.
    pub fn to_region(&self) -> Region {
        let xs = self.points.iter().map(|p| p.x);
        let ys = self.points.iter().map(|p| p.y);
        Region {
            x0: xs.clone().fold(f64::INFINITY, f64::min),
            y0: ys.clone().fold(f64::INFINITY, f64::min),
            x1: xs.fold(f64::NEG_INFINITY, f64::max),
            y1: ys.fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// RGB stroke color, components in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const RED: Rgb = Rgb {
        r: 1.0,
        g: 0.0,
        b: 0.0,
    };
}

/// One OCR-recognized text piece with its geometry and confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub bounds: Quad,
    pub confidence: f32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, bounds: Quad, confidence: f32) -> Self {
        TextFragment {
            text: text.into(),
            bounds,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_grows_every_side() {
        let r = Region::new(10.0, 20.0, 30.0, 40.0).expand(2.0);
        assert_eq!(r, Region::new(8.0, 18.0, 32.0, 42.0));
    }

    #[test]
    fn test_region_validity() {
        assert!(Region::new(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Region::new(5.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Region::new(0.0, 0.0, f64::NAN, 1.0).is_valid());
    }

    #[test]
    fn test_quad_bounding_region() {
        // Rotated quad: the bounding box still spans the extremes.
        let quad = Quad::new([
            Point { x: 5.0, y: 0.0 },
            Point { x: 10.0, y: 5.0 },
            Point { x: 5.0, y: 10.0 },
            Point { x: 0.0, y: 5.0 },
        ]);
        assert_eq!(quad.to_region(), Region::new(0.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_quad_region_round_trip() {
        let region = Region::new(1.0, 2.0, 3.0, 4.0);
        assert_eq!(Quad::from_region(region).to_region(), region);
    }
}
