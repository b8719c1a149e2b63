//! Column-major keypoint table storage and per-frame slicing.

use smallvec::SmallVec;

use crate::constants::{FrameIndex, PixelCoord};

/// Component of a tracked keypoint column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    X,
    Y,
    Likelihood,
}

impl Component {
    /// Header label as written by the upstream tracker.
    pub fn label(&self) -> &'static str {
        match self {
            Component::X => "x",
            Component::Y => "y",
            Component::Likelihood => "likelihood",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "x" => Some(Component::X),
            "y" => Some(Component::Y),
            "likelihood" => Some(Component::Likelihood),
            _ => None,
        }
    }
}

/// Identity of one table column: a bodypart label plus the component it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnKey {
    pub bodypart: String,
    pub component: Component,
}

/// Column indices of one tracked sub-point (one bodypart label).
#[derive(Debug, Clone, Copy)]
pub struct BodypartColumns {
    pub x: usize,
    pub y: usize,
    pub likelihood: Option<usize>,
}

/// Labeled, multi-axis keypoint table: rows = frames, columns keyed by
/// `(bodypart, component)`.
///
/// The tracking-model level of the upstream header is stripped at load and
/// retained only for artifact round-trips. The column set is fixed after
/// construction; operations produce filtered copies or per-frame views,
/// never in-place column mutation.
///
/// Invariants
/// -----------------
/// * Every column has exactly `n_frames()` values.
/// * Frame *i* of the table corresponds to frame *i* of the paired video
///   (validated against the video at load time by the batch orchestrator).
#[derive(Debug, Clone)]
pub struct KeypointTable {
    model: Option<String>,
    columns: Vec<ColumnKey>,
    data: Vec<Vec<f64>>,
    n_frames: usize,
}

impl KeypointTable {
    /// Assemble a table from parallel column keys and column data.
    ///
    /// Panics in debug builds if column lengths disagree; production callers
    /// go through the CSV reader, which validates row lengths up front.
    pub fn from_columns(
        model: Option<String>,
        columns: Vec<ColumnKey>,
        data: Vec<Vec<f64>>,
    ) -> Self {
        debug_assert_eq!(columns.len(), data.len(), "key/data column mismatch");
        let n_frames = data.first().map_or(0, Vec::len);
        debug_assert!(
            data.iter().all(|c| c.len() == n_frames),
            "ragged column lengths"
        );
        Self {
            model,
            columns,
            data,
            n_frames,
        }
    }

    #[inline]
    pub fn n_frames(&self) -> usize {
        self.n_frames
    }

    #[inline]
    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    #[inline]
    pub fn column_keys(&self) -> &[ColumnKey] {
        &self.columns
    }

    #[inline]
    pub fn column(&self, idx: usize) -> &[f64] {
        &self.data[idx]
    }

    /// Group columns by bodypart label, keeping only labels that contain
    /// `pattern` as a substring (the upstream tracker names sub-points
    /// `pupil_1`, `pupil_2`, … so `"pupil"` selects the whole rim).
    ///
    /// An empty pattern selects every bodypart. Labels missing either
    /// coordinate column are dropped from the result.
    pub fn bodypart_groups(&self, pattern: &str) -> Vec<BodypartColumns> {
        let mut labels: Vec<&str> = Vec::new();
        for key in &self.columns {
            if key.bodypart.contains(pattern) && !labels.contains(&key.bodypart.as_str()) {
                labels.push(&key.bodypart);
            }
        }

        labels
            .into_iter()
            .filter_map(|label| {
                let find = |component: Component| {
                    self.columns
                        .iter()
                        .position(|k| k.bodypart == label && k.component == component)
                };
                let x = find(Component::X)?;
                let y = find(Component::Y)?;
                Some(BodypartColumns {
                    x,
                    y,
                    likelihood: find(Component::Likelihood),
                })
            })
            .collect()
    }

    /// Slice one frame's point cloud for a set of bodypart groups.
    ///
    /// Points are returned in group order; missing coordinates propagate as
    /// NaN and are filtered by the ellipse fitter, not here.
    pub fn point_cloud(
        &self,
        frame: FrameIndex,
        groups: &[BodypartColumns],
    ) -> SmallVec<[[PixelCoord; 2]; 8]> {
        groups
            .iter()
            .map(|g| [self.data[g.x][frame], self.data[g.y][frame]])
            .collect()
    }

    /// Copy of this table restricted to coordinate columns (x and y), in the
    /// original column order. Likelihood columns are dropped.
    pub fn coordinates_only(&self) -> KeypointTable {
        let mut columns = Vec::new();
        let mut data = Vec::new();
        for (key, values) in self.columns.iter().zip(&self.data) {
            if key.component != Component::Likelihood {
                columns.push(key.clone());
                data.push(values.clone());
            }
        }
        KeypointTable::from_columns(self.model.clone(), columns, data)
    }

    /// Replace the values of column `idx`. Length must match the frame count.
    pub(crate) fn set_column(&mut self, idx: usize, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.n_frames);
        self.data[idx] = values;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> KeypointTable {
        let columns = vec![
            ColumnKey {
                bodypart: "pupil_1".into(),
                component: Component::X,
            },
            ColumnKey {
                bodypart: "pupil_1".into(),
                component: Component::Y,
            },
            ColumnKey {
                bodypart: "pupil_1".into(),
                component: Component::Likelihood,
            },
            ColumnKey {
                bodypart: "eyelid_1".into(),
                component: Component::X,
            },
            ColumnKey {
                bodypart: "eyelid_1".into(),
                component: Component::Y,
            },
            ColumnKey {
                bodypart: "eyelid_1".into(),
                component: Component::Likelihood,
            },
        ];
        let data = vec![
            vec![1.0, 2.0],
            vec![10.0, 20.0],
            vec![0.99, 0.98],
            vec![5.0, 6.0],
            vec![50.0, 60.0],
            vec![0.97, 0.96],
        ];
        KeypointTable::from_columns(Some("model".into()), columns, data)
    }

    #[test]
    fn bodypart_groups_filter_by_substring() {
        let table = sample_table();
        let pupil = table.bodypart_groups("pupil");
        assert_eq!(pupil.len(), 1);
        assert_eq!(pupil[0].x, 0);
        assert_eq!(pupil[0].y, 1);
        assert_eq!(pupil[0].likelihood, Some(2));

        let all = table.bodypart_groups("");
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn point_cloud_pairs_coordinates_in_group_order() {
        let table = sample_table();
        let groups = table.bodypart_groups("");
        let cloud = table.point_cloud(1, &groups);
        assert_eq!(cloud.as_slice(), &[[2.0, 20.0], [6.0, 60.0]]);
    }

    #[test]
    fn coordinates_only_drops_likelihood_columns() {
        let table = sample_table();
        let coords = table.coordinates_only();
        assert_eq!(coords.n_columns(), 4);
        assert_eq!(coords.n_frames(), 2);
        assert!(coords
            .column_keys()
            .iter()
            .all(|k| k.component != Component::Likelihood));
    }
}
