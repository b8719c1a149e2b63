//! Masked/interpolated artifact persistence, end to end through the CSV layer.

use camino::Utf8Path;
use pupillometry::interpolation::{interpolate_linear, mask_low_likelihood, persist_artifacts};
use pupillometry::keypoints::csv_reader::{read_table, read_table_from};

const TRACKED_CSV: &str = "\
scorer,net50,net50,net50
bodyparts,pupil_1,pupil_1,pupil_1
coords,x,y,likelihood
0,10.0,20.0,0.99
1,11.0,21.0,0.2
2,12.0,22.0,0.99
";

#[test]
fn artifacts_land_under_the_interpolated_directory_and_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = Utf8Path::from_path(tmp.path()).unwrap().join("interpolated_data");

    let table = read_table_from(TRACKED_CSV.as_bytes()).unwrap();
    let masked = mask_low_likelihood(&table, 0.9);
    let filled = interpolate_linear(&masked);
    persist_artifacts(&masked, &filled, &dir, "mouse42_sess1").unwrap();

    let masked_back = read_table(&dir.join("mouse42_sess1_masked.csv")).unwrap();
    assert_eq!(masked_back.n_columns(), 2);
    assert!(masked_back.column(0)[1].is_nan());

    let filled_back = read_table(&dir.join("mouse42_sess1_interpolated.csv")).unwrap();
    assert!((filled_back.column(0)[1] - 11.0).abs() < 1e-9);
    assert!((filled_back.column(1)[1] - 21.0).abs() < 1e-9);
}
