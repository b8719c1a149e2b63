//! Ellipse overlay drawing.

use opencv::core::{Mat, Point, Scalar, Size};
use opencv::imgproc;

use crate::ellipse::EllipseParams;
use crate::pupillometry_errors::PupillometryError;

/// Default overlay color, BGR (yellow).
pub const ANNOTATION_BGR: (f64, f64, f64) = (0.0, 255.0, 255.0);

/// Default overlay stroke thickness in pixels.
pub const ANNOTATION_THICKNESS: i32 = 1;

/// Draw the fitted ellipse outline onto `frame` in place.
///
/// OpenCV's axes argument takes half-axis lengths, so the stored semi-axes
/// are passed as-is (the drawn full axes are twice the stored values) in
/// stored order; the rotation is converted to degrees. Sub-pixel parameters
/// are rounded to the pixel grid.
pub fn draw_ellipse(
    frame: &mut Mat,
    params: &EllipseParams,
    color: Scalar,
    thickness: i32,
) -> Result<(), PupillometryError> {
    let center = Point::new(
        params.center_x.round() as i32,
        params.center_y.round() as i32,
    );
    let axes = Size::new(
        params.a.abs().round() as i32,
        params.b.abs().round() as i32,
    );
    imgproc::ellipse(
        frame,
        center,
        axes,
        params.theta.to_degrees(),
        0.0,
        360.0,
        color,
        thickness,
        imgproc::LINE_8,
        0,
    )?;
    Ok(())
}

/// The default overlay color as an OpenCV scalar.
pub fn annotation_color() -> Scalar {
    Scalar::new(ANNOTATION_BGR.0, ANNOTATION_BGR.1, ANNOTATION_BGR.2, 0.0)
}
