//! Stimulus-marker pixel detection.
//!
//! Recording rigs burn a colored marker into a fixed corner pixel while the
//! stimulus is on. Detection is a single-pixel inclusive BGR range check,
//! deliberately free of any neighborhood averaging.

use opencv::core::{Mat, MatTraitConst, Vec3b};

use crate::constants::{MARKER_LOWER, MARKER_PIXEL, MARKER_UPPER};
use crate::pupillometry_errors::PupillometryError;

/// Marker-pixel position and inclusive per-channel BGR bounds.
#[derive(Debug, Clone, Copy)]
pub struct MarkerSpec {
    /// Pixel position as (row, col).
    pub pixel: (i32, i32),
    /// Inclusive lower BGR bound.
    pub lower: [u8; 3],
    /// Inclusive upper BGR bound.
    pub upper: [u8; 3],
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            pixel: MARKER_PIXEL,
            lower: MARKER_LOWER,
            upper: MARKER_UPPER,
        }
    }
}

impl MarkerSpec {
    /// True iff every channel of the marker pixel lies within the bounds,
    /// boundaries included.
    pub fn is_marked(&self, frame: &Mat) -> Result<bool, PupillometryError> {
        let (row, col) = self.pixel;
        let px = frame.at_2d::<Vec3b>(row, col)?;
        Ok((0..3).all(|i| self.lower[i] <= px[i] && px[i] <= self.upper[i]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Scalar, CV_8UC3};

    fn uniform_frame(b: f64, g: f64, r: f64) -> Mat {
        Mat::new_rows_cols_with_default(20, 20, CV_8UC3, Scalar::new(b, g, r, 0.0)).unwrap()
    }

    #[test]
    fn in_range_pixel_is_marked() {
        let frame = uniform_frame(5.0, 5.0, 245.0);
        assert!(MarkerSpec::default().is_marked(&frame).unwrap());
    }

    #[test]
    fn bounds_are_inclusive_on_both_ends() {
        let lower_edge = uniform_frame(0.0, 0.0, 235.0);
        assert!(MarkerSpec::default().is_marked(&lower_edge).unwrap());

        let upper_edge = uniform_frame(20.0, 20.0, 255.0);
        assert!(MarkerSpec::default().is_marked(&upper_edge).unwrap());
    }

    #[test]
    fn single_out_of_range_channel_rejects() {
        let too_blue = uniform_frame(21.0, 0.0, 245.0);
        assert!(!MarkerSpec::default().is_marked(&too_blue).unwrap());

        let too_dim_red = uniform_frame(0.0, 0.0, 234.0);
        assert!(!MarkerSpec::default().is_marked(&too_dim_red).unwrap());
    }
}
