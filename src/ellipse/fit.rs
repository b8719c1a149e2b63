//! Direct least-squares ellipse fitting (Fitzgibbon et al., 1999, in the
//! numerically stable partitioning of Halír & Flusser).
//!
//! The conic `A x² + B xy + C y² + D x + E y + F = 0` is estimated by
//! minimizing the algebraic distance under the ellipse constraint
//! `4AC − B² > 0`, via a 3×3 generalized eigenproblem on the reduced scatter
//! matrix. Points are normalized (centroid shift, √2 mean-distance scale)
//! before building the design matrix and the coefficients are mapped back
//! afterwards.
//!
//! Exactly-fit inputs (e.g. four points, which admit a whole pencil of
//! conics) make the reduced eigenproblem rank-deficient. The null space is
//! then resolved deterministically by taking the member that maximizes the
//! ellipse discriminant `4AC − B²`, so four points sampled from a circle
//! recover that circle.

use nalgebra::{Matrix3, Vector3};

use super::EllipseParams;

/// Fit an ellipse to at least 4 points (callers gate the count).
///
/// Returns `None` on any numerical degeneracy: collinear or coincident
/// points, singular scatter blocks, or a conic that is not a proper ellipse.
pub fn fit_ellipse_direct(points: &[[f64; 2]]) -> Option<EllipseParams> {
    let (mean_x, mean_y, scale) = normalization_params(points);

    // Scatter blocks of the design matrix D = [D1 | D2],
    // D1 = [x², xy, y²], D2 = [x, y, 1], in normalized coordinates.
    let mut s1 = Matrix3::zeros();
    let mut s2 = Matrix3::zeros();
    let mut s3 = Matrix3::zeros();
    for &[px, py] in points {
        let x = (px - mean_x) * scale;
        let y = (py - mean_y) * scale;
        let z1 = Vector3::new(x * x, x * y, y * y);
        let z2 = Vector3::new(x, y, 1.0);
        s1 += z1 * z1.transpose();
        s2 += z1 * z2.transpose();
        s3 += z2 * z2.transpose();
    }

    // Reduced scatter: Sred = S1 − S2 S3⁻¹ S2ᵀ. S3 is singular for
    // coincident/degenerate point sets; that is a "no fit", not a fault.
    let s3_inv = s3.try_inverse()?;
    let t = -s3_inv * s2.transpose();
    let reduced = s1 + s2 * t;

    // Constraint matrix C1 for 4AC − B² > 0; solve C1⁻¹ Sred a1 = λ a1.
    let c1_inv = Matrix3::new(0.0, 0.0, 0.5, 0.0, -1.0, 0.0, 0.5, 0.0, 0.0);
    let system = c1_inv * reduced;

    let a1 = constrained_eigenvector(&system)?;
    let a2 = t * a1;

    let coeffs = denormalize_conic(
        &[a1[0], a1[1], a1[2], a2[0], a2[1], a2[2]],
        mean_x,
        mean_y,
        scale,
    );
    conic_to_ellipse(&coeffs)
}

/// Eigenvector of `system` satisfying the ellipse constraint `4AC − B² > 0`.
///
/// Eigenvalues come from the characteristic cubic; each eigenspace is
/// extracted with an SVD of the shifted matrix so that rank-deficient cases
/// (exact fits) expose their full null space, within which the discriminant
/// is maximized. Among valid candidates the one with the smallest algebraic
/// error |λ| wins.
fn constrained_eigenvector(system: &Matrix3<f64>) -> Option<Vector3<f64>> {
    let a = system;
    let tr = a[(0, 0)] + a[(1, 1)] + a[(2, 2)];
    let minor_sum = a[(0, 0)] * a[(1, 1)] - a[(0, 1)] * a[(1, 0)] + a[(0, 0)] * a[(2, 2)]
        - a[(0, 2)] * a[(2, 0)]
        + a[(1, 1)] * a[(2, 2)]
        - a[(1, 2)] * a[(2, 1)];
    let det = a.determinant();

    let mut best: Option<(f64, Vector3<f64>)> = None;
    for ev in solve_cubic_real(1.0, -tr, minor_sum, -det) {
        let shifted = system - Matrix3::identity() * ev;
        let Some(basis) = near_null_space(&shifted) else {
            continue;
        };
        let v = maximize_discriminant(&basis);
        if discriminant(&v) > 0.0 {
            let score = ev.abs();
            if best.map_or(true, |(s, _)| score < s) {
                best = Some((score, v));
            }
        }
    }
    best.map(|(_, v)| v)
}

/// Ellipse discriminant `4 v₀ v₂ − v₁²` of a quadratic-part vector.
#[inline]
fn discriminant(v: &Vector3<f64>) -> f64 {
    4.0 * v[0] * v[2] - v[1] * v[1]
}

/// Symmetric bilinear form underlying [`discriminant`].
#[inline]
fn discriminant_form(u: &Vector3<f64>, w: &Vector3<f64>) -> f64 {
    2.0 * (u[0] * w[2] + u[2] * w[0]) - u[1] * w[1]
}

/// Orthonormal basis of the (near-)null space of a 3×3 matrix.
///
/// Returns the right singular vectors whose singular values fall below a
/// relative tolerance; when none do (the shifted matrix is numerically far
/// from singular), the single vector of smallest singular value is used.
fn near_null_space(m: &Matrix3<f64>) -> Option<Vec<Vector3<f64>>> {
    let svd = m.svd(false, true);
    let v_t = svd.v_t?;
    let sigma = svd.singular_values;

    let sigma_max = sigma.iter().cloned().fold(0.0_f64, f64::max);
    let tol = 1e-8 * sigma_max.max(1.0);

    let mut basis: Vec<Vector3<f64>> = (0..3)
        .filter(|&i| sigma[i] < tol)
        .map(|i| v_t.row(i).transpose())
        .collect();

    if basis.is_empty() {
        let i_min = (0..3).min_by(|&i, &j| sigma[i].total_cmp(&sigma[j]))?;
        basis.push(v_t.row(i_min).transpose());
    }
    Some(basis)
}

/// Unit vector in `span(basis)` maximizing the ellipse discriminant.
fn maximize_discriminant(basis: &[Vector3<f64>]) -> Vector3<f64> {
    match basis {
        [v] => *v,
        [u, w] => {
            // 2×2 symmetric eigenproblem of the discriminant form restricted
            // to the (orthonormal) basis.
            let p = discriminant_form(u, u);
            let r = discriminant_form(u, w);
            let s = discriminant_form(w, w);
            if r.abs() < 1e-15 {
                if p >= s {
                    *u
                } else {
                    *w
                }
            } else {
                let lambda = 0.5 * (p + s) + (0.25 * (p - s) * (p - s) + r * r).sqrt();
                let v = u * r + w * (lambda - p);
                v / v.norm()
            }
        }
        // Whole space: the maximizer of 4v₀v₂ − v₁² is (1, 0, 1)/√2.
        _ => Vector3::new(1.0, 0.0, 1.0) / std::f64::consts::SQRT_2,
    }
}

/// Real roots of `a x³ + b x² + c x + d = 0` (one or three).
fn solve_cubic_real(a: f64, b: f64, c: f64, d: f64) -> Vec<f64> {
    let a_inv = 1.0 / a;
    let b_ = b * a_inv;
    let c_ = c * a_inv;
    let d_ = d * a_inv;

    let p = c_ - b_ * b_ / 3.0;
    let q = 2.0 * b_ * b_ * b_ / 27.0 - b_ * c_ / 3.0 + d_;

    let disc = -4.0 * p * p * p - 27.0 * q * q;
    let shift = -b_ / 3.0;

    if disc >= 0.0 {
        let r = (-p / 3.0).max(0.0).sqrt();
        let cos_arg = if r.abs() < 1e-15 {
            0.0
        } else {
            (-q / (2.0 * r * r * r)).clamp(-1.0, 1.0)
        };
        let theta = cos_arg.acos();
        let two_r = 2.0 * r;
        vec![
            two_r * (theta / 3.0).cos() + shift,
            two_r * ((theta + 2.0 * std::f64::consts::PI) / 3.0).cos() + shift,
            two_r * ((theta + 4.0 * std::f64::consts::PI) / 3.0).cos() + shift,
        ]
    } else {
        let sqrt_disc = (q * q / 4.0 + p * p * p / 27.0).sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    }
}

/// Normalization parameters: centroid and scale so that the mean distance
/// from the centroid is ≈ √2.
fn normalization_params(points: &[[f64; 2]]) -> (f64, f64, f64) {
    let n = points.len() as f64;
    let mean_x: f64 = points.iter().map(|p| p[0]).sum::<f64>() / n;
    let mean_y: f64 = points.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = points
        .iter()
        .map(|p| ((p[0] - mean_x).powi(2) + (p[1] - mean_y).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let scale = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    (mean_x, mean_y, scale)
}

/// Map conic coefficients from normalized coordinates back to the original
/// frame, substituting `x' = s(x − mx)`, `y' = s(y − my)`.
fn denormalize_conic(c: &[f64; 6], mx: f64, my: f64, s: f64) -> [f64; 6] {
    let [a_, b_, c_, d_, e_, f_] = *c;
    let s2 = s * s;

    let a = a_ * s2;
    let b = b_ * s2;
    let c = c_ * s2;
    let d = -2.0 * a_ * s2 * mx - b_ * s2 * my + d_ * s;
    let e = -b_ * s2 * mx - 2.0 * c_ * s2 * my + e_ * s;
    let f =
        a_ * s2 * mx * mx + b_ * s2 * mx * my + c_ * s2 * my * my - d_ * s * mx - e_ * s * my + f_;

    [a, b, c, d, e, f]
}

/// Convert general conic coefficients to the five-parameter ellipse.
///
/// The semi-axis `a` lies along the direction `theta`, `b` perpendicular to
/// it; the pair comes out in eigenvalue order, which is **not** sorted by
/// magnitude. Returns `None` when the conic is not a proper finite ellipse.
fn conic_to_ellipse(coeffs: &[f64; 6]) -> Option<EllipseParams> {
    let [a, b, c, d, e, f] = *coeffs;

    let disc = b * b - 4.0 * a * c;
    if disc >= 0.0 {
        return None;
    }

    // Center from the gradient system 2A·cx + B·cy + D = 0, B·cx + 2C·cy + E = 0.
    let denom = -disc;
    let cx = (b * e - 2.0 * c * d) / denom;
    let cy = (b * d - 2.0 * a * e) / denom;

    let theta = if (a - c).abs() < 1e-15 && b.abs() < 1e-15 {
        0.0
    } else {
        0.5 * b.atan2(a - c)
    };

    // Eigenvalues of the quadratic part; λ1 pairs with the direction theta.
    let sum = a + c;
    let diff = ((a - c).powi(2) + b * b).sqrt();
    let lambda1 = 0.5 * (sum + diff);
    let lambda2 = 0.5 * (sum - diff);

    let f_center = a * cx * cx + b * cx * cy + c * cy * cy + d * cx + e * cy + f;
    if f_center.abs() < 1e-300 {
        return None;
    }

    let a_sq = -f_center / lambda1;
    let b_sq = -f_center / lambda2;
    if a_sq <= 0.0 || b_sq <= 0.0 {
        return None;
    }

    let params = EllipseParams {
        center_x: cx,
        center_y: cy,
        a: a_sq.sqrt(),
        b: b_sq.sqrt(),
        theta,
    };
    let finite = params.center_x.is_finite()
        && params.center_y.is_finite()
        && params.a.is_finite()
        && params.b.is_finite()
        && params.theta.is_finite();
    finite.then_some(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_ellipse(cx: f64, cy: f64, a: f64, b: f64, theta: f64, n: usize) -> Vec<[f64; 2]> {
        let (sin_t, cos_t) = theta.sin_cos();
        (0..n)
            .map(|i| {
                let t = 2.0 * std::f64::consts::PI * (i as f64) / (n as f64);
                let px = a * t.cos();
                let py = b * t.sin();
                [cx + cos_t * px - sin_t * py, cy + sin_t * px + cos_t * py]
            })
            .collect()
    }

    /// Implicit-form residual of a point against fitted parameters.
    fn implicit_residual(p: &EllipseParams, x: f64, y: f64) -> f64 {
        let (sin_t, cos_t) = p.theta.sin_cos();
        let dx = x - p.center_x;
        let dy = y - p.center_y;
        let u = cos_t * dx + sin_t * dy;
        let v = -sin_t * dx + cos_t * dy;
        (u / p.a).powi(2) + (v / p.b).powi(2) - 1.0
    }

    #[test]
    fn recovers_rotated_ellipse() {
        let pts = sample_ellipse(100.0, 80.0, 30.0, 15.0, 0.3, 50);
        let p = fit_ellipse_direct(&pts).expect("fit should succeed");
        assert_relative_eq!(p.center_x, 100.0, epsilon = 1e-6);
        assert_relative_eq!(p.center_y, 80.0, epsilon = 1e-6);
        // Axis order is fit-dependent: compare as an unordered pair.
        let (lo, hi) = if p.a < p.b { (p.a, p.b) } else { (p.b, p.a) };
        assert_relative_eq!(lo, 15.0, epsilon = 1e-6);
        assert_relative_eq!(hi, 30.0, epsilon = 1e-6);
    }

    #[test]
    fn axis_and_angle_pairing_is_consistent() {
        // Whatever order the axes come out in, the parametric boundary the
        // annotator draws must pass through the input points.
        for theta in [0.0, 0.3, -0.7, std::f64::consts::FRAC_PI_2] {
            let pts = sample_ellipse(50.0, 60.0, 20.0, 8.0, theta, 40);
            let p = fit_ellipse_direct(&pts).expect("fit should succeed");
            for &[x, y] in &pts {
                assert!(
                    implicit_residual(&p, x, y).abs() < 1e-6,
                    "point ({x}, {y}) off fitted boundary for theta={theta}"
                );
            }
        }
    }

    #[test]
    fn noisy_points_fit_within_tolerance() {
        // Deterministic pseudo-noise; σ ≈ 0.3 px on a 30 px axis.
        let mut pts = sample_ellipse(200.0, 150.0, 30.0, 22.0, -0.5, 120);
        for (i, p) in pts.iter_mut().enumerate() {
            let wobble = ((i as f64) * 12.9898).sin() * 0.3;
            p[0] += wobble;
            p[1] -= wobble * 0.7;
        }
        let p = fit_ellipse_direct(&pts).expect("fit should succeed with noise");
        assert_relative_eq!(p.center_x, 200.0, epsilon = 1.0);
        assert_relative_eq!(p.center_y, 150.0, epsilon = 1.0);
    }

    #[test]
    fn collinear_points_yield_no_fit() {
        let pts: Vec<[f64; 2]> = (0..8).map(|i| [i as f64, 2.0 * i as f64 + 1.0]).collect();
        assert!(fit_ellipse_direct(&pts).is_none());
    }

    #[test]
    fn coincident_points_yield_no_fit() {
        let pts = vec![[3.0, 4.0]; 10];
        assert!(fit_ellipse_direct(&pts).is_none());
    }

    #[test]
    fn two_point_clusters_yield_no_fit() {
        let mut pts = vec![[0.0, 0.0]; 4];
        pts.extend(vec![[10.0, 10.0]; 4]);
        assert!(fit_ellipse_direct(&pts).is_none());
    }

    #[test]
    fn parameters_are_finite_for_valid_fits() {
        let pts = sample_ellipse(10.0, 10.0, 8.0, 5.0, std::f64::consts::FRAC_PI_4, 25);
        let p = fit_ellipse_direct(&pts).unwrap();
        for v in [p.center_x, p.center_y, p.a, p.b, p.theta] {
            assert!(v.is_finite());
        }
        assert!(p.area() >= 0.0);
    }
}
