use crate::{BigFloat, BoundsError};
use serde::{Deserialize, Serialize};

/// Rectangle in the complex plane. x is the real axis, y the imaginary axis.
///
/// Pixel row 0 maps to `y_min`, matching the texture layout of the display
/// layer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl ViewBounds {
    /// Create bounds, rejecting non-finite values and empty ranges.
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Result<Self, BoundsError> {
        let bounds = Self {
            x_min,
            x_max,
            y_min,
            y_max,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check the invariants `new` enforces. Fields are public, so anything
    /// built by hand goes through this before rendering.
    pub fn validate(&self) -> Result<(), BoundsError> {
        let all_finite = [self.x_min, self.x_max, self.y_min, self.y_max]
            .iter()
            .all(|v| v.is_finite());
        if !all_finite {
            return Err(BoundsError::NotFinite {
                x_min: self.x_min,
                x_max: self.x_max,
                y_min: self.y_min,
                y_max: self.y_max,
            });
        }
        if self.x_max <= self.x_min {
            return Err(BoundsError::EmptyRange {
                axis: 'x',
                min: self.x_min,
                max: self.x_max,
            });
        }
        if self.y_max <= self.y_min {
            return Err(BoundsError::EmptyRange {
                axis: 'y',
                min: self.y_min,
                max: self.y_max,
            });
        }
        Ok(())
    }

    /// Whole-set starting view: x in [-2.5, 1.5], y centred on the real axis
    /// with the extent implied by the resolution's aspect ratio.
    pub fn initial(resolution_x: u32, resolution_y: u32) -> Self {
        let x_min = -2.5;
        let x_max = 1.5;
        let half_height = (x_max - x_min) / 2.0 * (resolution_y as f64 / resolution_x as f64);
        Self {
            x_min,
            x_max,
            y_min: -half_height,
            y_max: half_height,
        }
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Map pixel `(x, y)` to its point in the complex plane.
    #[inline]
    pub fn point_at(&self, x: u32, y: u32, resolution_x: u32, resolution_y: u32) -> (f64, f64) {
        let x_pix = x as f64 / resolution_x as f64;
        let y_pix = y as f64 / resolution_y as f64;
        (
            lerp(self.x_min, self.x_max, x_pix),
            lerp(self.y_min, self.y_max, y_pix),
        )
    }

    /// Bounds covering pixel rows `[first_row, first_row + rows)` of an image
    /// `resolution_y` rows tall. The x range is unchanged.
    pub fn row_band(&self, first_row: u32, rows: u32, resolution_y: u32) -> Self {
        let start = first_row as f64 / resolution_y as f64;
        let end = (first_row + rows) as f64 / resolution_y as f64;
        Self {
            x_min: self.x_min,
            x_max: self.x_max,
            y_min: lerp(self.y_min, self.y_max, start),
            y_max: lerp(self.y_min, self.y_max, end),
        }
    }

    /// Interpolate between two views. `t = 0` and `t = 1` reproduce the
    /// endpoints bit-for-bit.
    pub fn interpolate(&self, target: &Self, t: f64) -> Self {
        Self {
            x_min: lerp(self.x_min, target.x_min, t),
            x_max: lerp(self.x_max, target.x_max, t),
            y_min: lerp(self.y_min, target.y_min, t),
            y_max: lerp(self.y_max, target.y_max, t),
        }
    }
}

/// `(1 - t) * a + t * b`; exact at both ends, unlike `a + t * (b - a)`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    (1.0 - t) * a + t * b
}

/// View bounds held as BigFloats for zooms deeper than f64 can express.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BigViewBounds {
    pub x_min: BigFloat,
    pub x_max: BigFloat,
    pub y_min: BigFloat,
    pub y_max: BigFloat,
}

impl BigViewBounds {
    pub fn from_view_bounds(bounds: &ViewBounds, precision_bits: usize) -> Self {
        Self {
            x_min: BigFloat::with_precision(bounds.x_min, precision_bits),
            x_max: BigFloat::with_precision(bounds.x_max, precision_bits),
            y_min: BigFloat::with_precision(bounds.y_min, precision_bits),
            y_max: BigFloat::with_precision(bounds.y_max, precision_bits),
        }
    }

    /// Parse decimal coordinate strings at the given precision.
    pub fn from_strings(
        x_min: &str,
        x_max: &str,
        y_min: &str,
        y_max: &str,
        precision_bits: usize,
    ) -> Result<Self, BoundsError> {
        let parse = |s: &str| BigFloat::from_string(s, precision_bits);
        let bounds = Self {
            x_min: parse(x_min)?,
            x_max: parse(x_max)?,
            y_min: parse(y_min)?,
            y_max: parse(y_max)?,
        };
        if bounds.x_max <= bounds.x_min {
            return Err(BoundsError::EmptyRange {
                axis: 'x',
                min: bounds.x_min.to_f64(),
                max: bounds.x_max.to_f64(),
            });
        }
        if bounds.y_max <= bounds.y_min {
            return Err(BoundsError::EmptyRange {
                axis: 'y',
                min: bounds.y_min.to_f64(),
                max: bounds.y_max.to_f64(),
            });
        }
        Ok(bounds)
    }

    pub fn precision_bits(&self) -> usize {
        self.x_min.precision_bits()
    }

    /// Nearest f64 view. Deep views collapse to a degenerate rectangle.
    pub fn to_view_bounds(&self) -> ViewBounds {
        ViewBounds {
            x_min: self.x_min.to_f64(),
            x_max: self.x_max.to_f64(),
            y_min: self.y_min.to_f64(),
            y_max: self.y_max.to_f64(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_inverted_x_range() {
        let err = ViewBounds::new(1.0, -1.0, -1.0, 1.0).unwrap_err();
        assert!(matches!(err, BoundsError::EmptyRange { axis: 'x', .. }));
    }

    #[test]
    fn new_rejects_empty_y_range() {
        let err = ViewBounds::new(-1.0, 1.0, 0.5, 0.5).unwrap_err();
        assert!(matches!(err, BoundsError::EmptyRange { axis: 'y', .. }));
    }

    #[test]
    fn new_rejects_nan() {
        assert!(matches!(
            ViewBounds::new(f64::NAN, 1.0, -1.0, 1.0),
            Err(BoundsError::NotFinite { .. })
        ));
    }

    #[test]
    fn initial_view_follows_aspect_ratio() {
        let b = ViewBounds::initial(1920, 1080);
        assert_eq!(b.x_min, -2.5);
        assert_eq!(b.x_max, 1.5);
        assert!((b.y_max - 1.125).abs() < 1e-12);
        assert!((b.y_min + 1.125).abs() < 1e-12);
    }

    #[test]
    fn point_at_maps_corners_and_centre() {
        let b = ViewBounds::new(-2.5, 1.5, -1.2, 1.2).unwrap();
        assert_eq!(b.point_at(0, 0, 100, 100), (-2.5, -1.2));
        let (re, im) = b.point_at(50, 50, 100, 100);
        assert!((re + 0.5).abs() < 1e-12);
        assert!(im.abs() < 1e-12);
    }

    #[test]
    fn row_band_splits_height_linearly() {
        let b = ViewBounds::new(-2.0, 2.0, -1.0, 1.0).unwrap();
        let band = b.row_band(25, 50, 100);
        assert_eq!(band.x_min, b.x_min);
        assert_eq!(band.x_max, b.x_max);
        assert!((band.y_min + 0.5).abs() < 1e-12);
        assert!((band.y_max - 0.5).abs() < 1e-12);
    }

    #[test]
    fn row_band_of_whole_image_is_identity() {
        let b = ViewBounds::new(-2.0, 2.0, -1.3, 0.7).unwrap();
        assert_eq!(b.row_band(0, 480, 480), b);
    }

    #[test]
    fn interpolate_is_exact_at_endpoints() {
        let a = ViewBounds::new(-2.5, 1.5, -1.125, 1.125).unwrap();
        let b = ViewBounds::new(-0.7431, -0.7429, 0.1311, 0.1313).unwrap();
        assert_eq!(a.interpolate(&b, 0.0), a);
        assert_eq!(a.interpolate(&b, 1.0), b);
    }

    #[test]
    fn big_bounds_parse_deep_coordinates() {
        let deep = BigViewBounds::from_strings(
            "-0.74364388703715870475219150611477",
            "-0.74364388703715870475219150611476",
            "0.13182590420531197049313205638513",
            "0.13182590420531197049313205638514",
            256,
        )
        .unwrap();
        assert_eq!(deep.precision_bits(), 256);
        assert!(deep.x_max > deep.x_min);
        // Collapses in f64
        let narrow = deep.to_view_bounds();
        assert_eq!(narrow.x_min, narrow.x_max);
    }

    #[test]
    fn big_bounds_reject_bad_strings() {
        assert!(matches!(
            BigViewBounds::from_strings("nope", "1", "0", "1", 256),
            Err(BoundsError::Parse(_))
        ));
    }
}
