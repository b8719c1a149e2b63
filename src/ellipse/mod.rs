//! # Ellipse fitting and geometry derivation
//!
//! Per-frame reconstruction of the pupil as an ellipse. The entry point is
//! [`fit_ellipse`]: it drops missing points, enforces the minimum-point
//! contract, and delegates to the direct least-squares conic estimator in
//! [`fit`].
//!
//! ## Axis order
//! -----------------
//! [`EllipseParams`] stores the two semi-axes **in fit order**: `a` is the
//! axis along `theta`, `b` the perpendicular one, and neither is guaranteed
//! to be the major axis. Consumers (area, drawing) must be symmetric under
//! swapping `a` and `b`; [`EllipseParams::area`] is.

pub mod fit;

use serde::Serialize;
use smallvec::SmallVec;

use crate::constants::{PixelCoord, Radian, MIN_FIT_POINTS};

/// Five-parameter ellipse: center, semi-axes, rotation.
///
/// Produced only by the fitter and immutable afterwards. `a` is the semi-axis
/// along the direction `theta` (radians, counterclockwise from +x), `b` the
/// perpendicular semi-axis; the order is fit-dependent, **not**
/// major-then-minor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EllipseParams {
    pub center_x: PixelCoord,
    pub center_y: PixelCoord,
    pub a: PixelCoord,
    pub b: PixelCoord,
    pub theta: Radian,
}

impl EllipseParams {
    /// Ellipse area, `π·|a|·|b|`.
    ///
    /// Symmetric under swapping the axes; ≈0 for degenerate axes is a valid
    /// result, not an error.
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.a.abs() * self.b.abs()
    }
}

/// Fit an ellipse to one frame's point cloud.
///
/// Arguments
/// -----------------
/// * `points`: Ordered (x, y) pairs for one bodypart group; pairs with a NaN
///   in either coordinate are treated as missing and dropped first.
///
/// Return
/// ----------
/// * `Some(EllipseParams)` when at least [`MIN_FIT_POINTS`] valid pairs
///   remain and the direct least-squares fit yields a proper ellipse.
/// * `None` for too few points **or** numerical degeneracy (collinear
///   points, singular scatter blocks, non-ellipse conic). Absence is a
///   defined per-frame result, never an error.
pub fn fit_ellipse(points: &[[PixelCoord; 2]]) -> Option<EllipseParams> {
    let valid: SmallVec<[[f64; 2]; 8]> = points
        .iter()
        .filter(|p| !p[0].is_nan() && !p[1].is_nan())
        .copied()
        .collect();
    if valid.len() < MIN_FIT_POINTS {
        return None;
    }
    fit::fit_ellipse_direct(&valid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Points on an axis-aligned circle of radius 5 centered at (100, 100).
    fn circle_points(n: usize) -> Vec<[f64; 2]> {
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                [100.0 + 5.0 * t.cos(), 100.0 + 5.0 * t.sin()]
            })
            .collect()
    }

    #[test]
    fn three_valid_points_yield_no_fit() {
        let pts = circle_points(3);
        assert!(fit_ellipse(&pts).is_none());
    }

    #[test]
    fn nan_pairs_count_as_missing() {
        // 4 valid + 2 missing: missing pairs must not count toward the
        // minimum, and must not poison the fit.
        let mut pts = circle_points(4);
        pts.push([f64::NAN, 42.0]);
        pts.push([7.0, f64::NAN]);
        let params = fit_ellipse(&pts).expect("4 valid points suffice");
        assert_relative_eq!(params.center_x, 100.0, epsilon = 1e-6);
        assert_relative_eq!(params.center_y, 100.0, epsilon = 1e-6);
    }

    #[test]
    fn four_points_on_a_circle_fit_the_circle() {
        let pts = circle_points(4);
        let params = fit_ellipse(&pts).expect("fit should succeed");
        assert_relative_eq!(params.center_x, 100.0, epsilon = 1e-6);
        assert_relative_eq!(params.center_y, 100.0, epsilon = 1e-6);
        assert_relative_eq!(params.a.abs(), 5.0, epsilon = 1e-6);
        assert_relative_eq!(params.b.abs(), 5.0, epsilon = 1e-6);
        assert_relative_eq!(params.area(), 78.539816, epsilon = 1e-4);
    }

    #[test]
    fn area_is_invariant_under_axis_swap() {
        let p = EllipseParams {
            center_x: 1.0,
            center_y: 2.0,
            a: 3.0,
            b: 7.0,
            theta: 0.4,
        };
        let swapped = EllipseParams { a: p.b, b: p.a, ..p };
        assert_relative_eq!(p.area(), swapped.area(), epsilon = 1e-12);
    }

    #[test]
    fn degenerate_axes_give_near_zero_area() {
        let p = EllipseParams {
            center_x: 0.0,
            center_y: 0.0,
            a: 1e-9,
            b: 4.0,
            theta: 0.0,
        };
        assert!(p.area() >= 0.0);
        assert!(p.area() < 1e-7);
    }
}
