//! Data-directory layout configuration.

use camino::{Utf8Path, Utf8PathBuf};

use crate::pupillometry_errors::PupillometryError;

/// Directory layout for one acquisition root.
///
/// The five directories are independent fields so callers can relocate any
/// of them; [`DataLayout::under`] reproduces the conventional layout:
///
/// ```text
/// <root>/tracked                     keypoint tables (input)
/// <root>/tracked/interpolated_data   masked/interpolated artifacts
/// <root>/video                       source videos (and annotated outputs)
/// <root>/area                        per-video result tables
/// <root>/analyzed                    consumed keypoint tables
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataLayout {
    pub tracked: Utf8PathBuf,
    pub video: Utf8PathBuf,
    pub area: Utf8PathBuf,
    pub analyzed: Utf8PathBuf,
    pub interpolated: Utf8PathBuf,
}

impl DataLayout {
    /// Conventional layout rooted at `root`.
    pub fn under(root: &Utf8Path) -> Self {
        Self {
            tracked: root.join("tracked"),
            video: root.join("video"),
            area: root.join("area"),
            analyzed: root.join("analyzed"),
            interpolated: root.join("tracked").join("interpolated_data"),
        }
    }

    /// Create every configured directory (idempotent).
    pub fn ensure_directories(&self) -> Result<(), PupillometryError> {
        for dir in [
            &self.tracked,
            &self.video,
            &self.area,
            &self.analyzed,
            &self.interpolated,
        ] {
            std::fs::create_dir_all(dir.as_std_path())?;
        }
        Ok(())
    }
}

impl Default for DataLayout {
    fn default() -> Self {
        Self::under(Utf8Path::new("data"))
    }
}
