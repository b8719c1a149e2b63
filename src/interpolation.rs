//! # Confidence gating and temporal interpolation
//!
//! Turns a raw keypoint table into a cleaned coordinate table in two steps:
//!
//! 1. [`mask_low_likelihood`] — every (x, y) pair whose paired likelihood is
//!    below the threshold becomes missing (NaN), independently per frame and
//!    per bodypart sub-point. The result carries coordinate columns only.
//! 2. [`interpolate_linear`] — per column, linear interpolation in frame
//!    index over **interior gaps only**: a run of NaN is filled iff it is
//!    strictly bounded by two finite values in the same column. Leading and
//!    trailing runs stay missing (no extrapolation), and an all-missing
//!    column passes through untouched without error.
//!
//! Both steps preserve row count and column identity exactly, and the second
//! step is idempotent: re-running it on its own output changes nothing.
//!
//! Columns are strictly independent — the x and y series of one sub-point are
//! never mixed, and no value crosses bodypart boundaries.

use camino::Utf8Path;

use crate::constants::Likelihood;
use crate::keypoints::csv_reader::write_table;
use crate::keypoints::table::KeypointTable;
use crate::pupillometry_errors::PupillometryError;

/// Replace low-confidence coordinates with the missing sentinel.
///
/// Arguments
/// -----------------
/// * `table`: The full keypoint table (coordinates and likelihoods).
/// * `threshold`: Likelihood threshold τ ∈ (0, 1); pairs with likelihood
///   **strictly below** τ are discarded. A non-finite likelihood (e.g. an
///   empty cell in the source table) never passes the gate.
///
/// Return
/// ----------
/// * A new table holding only the coordinate columns, with gated pairs set
///   to NaN. Sub-points without a likelihood column are copied unchanged.
pub fn mask_low_likelihood(table: &KeypointTable, threshold: Likelihood) -> KeypointTable {
    let mut masked = table.coordinates_only();
    // Group indices refer to the coordinate-only table; likelihood values
    // still come from the source table.
    let source_groups = table.bodypart_groups("");
    let masked_groups = masked.bodypart_groups("");
    debug_assert_eq!(source_groups.len(), masked_groups.len());

    for (src, dst) in source_groups.iter().zip(&masked_groups) {
        let Some(lik_idx) = src.likelihood else {
            continue;
        };
        let likelihoods = table.column(lik_idx).to_vec();
        for &coord_idx in &[dst.x, dst.y] {
            let mut values = masked.column(coord_idx).to_vec();
            for (value, &lik) in values.iter_mut().zip(&likelihoods) {
                if lik.is_nan() || lik < threshold {
                    *value = f64::NAN;
                }
            }
            masked.set_column(coord_idx, values);
        }
    }
    masked
}

/// Fill interior missing runs in every column by linear interpolation.
pub fn interpolate_linear(table: &KeypointTable) -> KeypointTable {
    let mut filled = table.clone();
    for idx in 0..filled.n_columns() {
        let mut values = filled.column(idx).to_vec();
        interpolate_column(&mut values);
        filled.set_column(idx, values);
    }
    filled
}

/// In-place linear interpolation of one time series.
///
/// Only interior gaps are filled: a NaN run bounded by finite values at
/// indices `i` and `j` (i < j) is replaced by the line through
/// `(i, values[i])` and `(j, values[j])`. Runs touching either end of the
/// series are left as NaN.
pub fn interpolate_column(values: &mut [f64]) {
    let mut prev_known: Option<usize> = None;
    let mut i = 0;
    while i < values.len() {
        if values[i].is_nan() {
            i += 1;
            continue;
        }
        if let Some(p) = prev_known {
            if i > p + 1 {
                let span = (i - p) as f64;
                let (v0, v1) = (values[p], values[i]);
                for k in (p + 1)..i {
                    let t = (k - p) as f64 / span;
                    values[k] = v0 + (v1 - v0) * t;
                }
            }
        }
        prev_known = Some(i);
        i += 1;
    }
}

/// Persist the masked and interpolated artifacts for one input file.
///
/// Filenames are derived from `stem` (the keypoint filename prefix before
/// the model-suffix marker) with `_masked` / `_interpolated` qualifiers,
/// under the configured interpolated-data directory.
pub fn persist_artifacts(
    masked: &KeypointTable,
    interpolated: &KeypointTable,
    directory: &Utf8Path,
    stem: &str,
) -> Result<(), PupillometryError> {
    std::fs::create_dir_all(directory.as_std_path())?;
    write_table(masked, &directory.join(format!("{stem}_masked.csv")))?;
    write_table(interpolated, &directory.join(format!("{stem}_interpolated.csv")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypoints::csv_reader::read_table_from;

    fn assert_series_eq(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            if e.is_nan() {
                assert!(a.is_nan(), "expected NaN, got {a}");
            } else {
                assert!((a - e).abs() < 1e-12, "expected {e}, got {a}");
            }
        }
    }

    #[test]
    fn fills_interior_gap_linearly() {
        // Scenario: [1.0, NaN, NaN, 4.0] -> [1.0, 2.0, 3.0, 4.0]
        let mut values = [1.0, f64::NAN, f64::NAN, 4.0];
        interpolate_column(&mut values);
        assert_series_eq(&values, &[1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn leading_and_trailing_gaps_stay_missing() {
        let mut leading = [f64::NAN, f64::NAN, 5.0, 6.0];
        interpolate_column(&mut leading);
        assert_series_eq(&leading, &[f64::NAN, f64::NAN, 5.0, 6.0]);

        let mut trailing = [5.0, 6.0, f64::NAN];
        interpolate_column(&mut trailing);
        assert_series_eq(&trailing, &[5.0, 6.0, f64::NAN]);
    }

    #[test]
    fn all_missing_column_passes_through() {
        let mut values = [f64::NAN, f64::NAN, f64::NAN];
        interpolate_column(&mut values);
        assert!(values.iter().all(|v| v.is_nan()));
    }

    #[test]
    fn interpolation_is_idempotent() {
        let mut values = [f64::NAN, 1.0, f64::NAN, 3.0, f64::NAN];
        interpolate_column(&mut values);
        let first_pass = values;
        interpolate_column(&mut values);
        assert_series_eq(&values, &first_pass);
    }

    #[test]
    fn multiple_interior_gaps() {
        let mut values = [0.0, f64::NAN, 2.0, f64::NAN, f64::NAN, 8.0];
        interpolate_column(&mut values);
        assert_series_eq(&values, &[0.0, 1.0, 2.0, 4.0, 6.0, 8.0]);
    }

    const TABLE: &str = "\
bodyparts,pupil_1,pupil_1,pupil_1,pupil_2,pupil_2,pupil_2
coords,x,y,likelihood,x,y,likelihood
0,10.0,20.0,0.95,1.0,2.0,0.5
1,11.0,21.0,0.2,3.0,4.0,0.95
2,12.0,22.0,0.95,5.0,6.0,0.9
";

    #[test]
    fn gate_masks_both_coordinates_of_a_low_likelihood_pair() {
        let table = read_table_from(TABLE.as_bytes()).unwrap();
        let masked = mask_low_likelihood(&table, 0.9);

        // pupil_1 frame 1 gated (0.2 < 0.9); pupil_2 frame 0 gated (0.5 < 0.9).
        assert_eq!(masked.n_columns(), 4);
        assert_series_eq(masked.column(0), &[10.0, f64::NAN, 12.0]);
        assert_series_eq(masked.column(1), &[20.0, f64::NAN, 22.0]);
        assert_series_eq(masked.column(2), &[f64::NAN, 3.0, 5.0]);
        assert_series_eq(masked.column(3), &[f64::NAN, 4.0, 6.0]);
    }

    #[test]
    fn nan_likelihood_gates_the_pair() {
        // An empty likelihood cell reads as NaN and must never let its
        // coordinates through.
        let input = "\
bodyparts,pupil_1,pupil_1,pupil_1
coords,x,y,likelihood
0,10.0,20.0,0.99
1,11.0,21.0,
2,12.0,22.0,0.99
";
        let table = read_table_from(input.as_bytes()).unwrap();
        let masked = mask_low_likelihood(&table, 0.9);
        assert_series_eq(masked.column(0), &[10.0, f64::NAN, 12.0]);
        assert_series_eq(masked.column(1), &[20.0, f64::NAN, 22.0]);
    }

    #[test]
    fn gate_boundary_is_strict_less_than() {
        let table = read_table_from(TABLE.as_bytes()).unwrap();
        let masked = mask_low_likelihood(&table, 0.9);
        // pupil_2 frame 2 has likelihood exactly 0.9: kept.
        assert!((masked.column(2)[2] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn gate_then_interpolate_recovers_interior_pair() {
        let table = read_table_from(TABLE.as_bytes()).unwrap();
        let masked = mask_low_likelihood(&table, 0.9);
        let filled = interpolate_linear(&masked);

        // Interior gap on pupil_1 filled; leading gap on pupil_2 untouched.
        assert_series_eq(filled.column(0), &[10.0, 11.0, 12.0]);
        assert_series_eq(filled.column(1), &[20.0, 21.0, 22.0]);
        assert_series_eq(filled.column(2), &[f64::NAN, 3.0, 5.0]);
    }
}
