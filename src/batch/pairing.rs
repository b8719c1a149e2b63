//! Keypoint-table to source-video pairing.
//!
//! The upstream tracker names its output tables `<video-prefix>DLC<model…>.csv`,
//! so the stem prefix before the model-suffix marker identifies the video.
//! Videos whose names contain `ellipse` are previous annotated outputs and
//! never valid pairing candidates.

use camino::{Utf8Path, Utf8PathBuf};

use crate::constants::MODEL_SUFFIX_MARKER;
use crate::pupillometry_errors::PupillometryError;

/// Pairing prefix of a keypoint-table stem, `None` when the model-suffix
/// marker is absent (such files cannot be paired and are skipped).
pub fn derived_pattern(stem: &str) -> Option<&str> {
    stem.split_once(MODEL_SUFFIX_MARKER).map(|(prefix, _)| prefix)
}

/// Pick the video in `video_dir` whose filename contains `pattern`.
///
/// Annotated outputs (names containing `ellipse`) are excluded. Candidates
/// are scanned in lexicographic order so the choice is deterministic when
/// several match.
pub fn choose_video(
    video_dir: &Utf8Path,
    pattern: &str,
) -> Result<Option<Utf8PathBuf>, PupillometryError> {
    let mut candidates: Vec<Utf8PathBuf> = Vec::new();
    for entry in std::fs::read_dir(video_dir.as_std_path())? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = Utf8PathBuf::from_path_buf(entry.path())
            .map_err(|p| PupillometryError::Utf8PathError(p.display().to_string()))?;
        candidates.push(path);
    }
    candidates.sort();

    Ok(candidates.into_iter().find(|p| {
        p.file_name()
            .is_some_and(|name| name.contains(pattern) && !name.contains("ellipse"))
    }))
}
