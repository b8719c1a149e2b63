//! Batch driver: pair, process, persist, archive.

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use csv::WriterBuilder;
use opencv::highgui;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::batch::config::DataLayout;
use crate::batch::pairing::{choose_video, derived_pattern};
use crate::constants::{
    BatchOutcomes, ANNOTATED_SUFFIX, LIKELIHOOD_THRESHOLD, PROGRESS_LOG_EVERY,
};
use crate::ellipse::fit_ellipse;
use crate::interpolation::{interpolate_linear, mask_low_likelihood, persist_artifacts};
use crate::keypoints::csv_reader::read_table;
use crate::pupillometry_errors::PupillometryError;
use crate::video::annotate::{annotation_color, draw_ellipse, ANNOTATION_THICKNESS};
use crate::video::marker::MarkerSpec;
use crate::video::reader::{VideoReader, VideoSink};

/// Preview window title.
const PREVIEW_WINDOW: &str = "pupillometry";

/// Per-run processing options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Substring selecting the bodypart group to fit (e.g. `"pupil"` picks
    /// `pupil_1`, `pupil_2`, …).
    pub target_bodypart: String,
    /// Likelihood gate threshold τ; pairs strictly below are discarded.
    pub likelihood_threshold: f64,
    /// Write an annotated copy of each video.
    pub create_video: bool,
    /// Show a live preview window (`q` aborts the current file).
    pub show_video: bool,
    /// Stimulus-marker pixel specification.
    pub marker: MarkerSpec,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            target_bodypart: "pupil".to_owned(),
            likelihood_threshold: LIKELIHOOD_THRESHOLD,
            create_video: false,
            show_video: false,
            marker: MarkerSpec::default(),
        }
    }
}

/// One output row per video frame.
///
/// Geometry fields are `None` when the frame had no usable fit (too few
/// valid points or a degenerate conic); they serialize as empty CSV cells.
/// The marker flag is always present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    pub area: Option<f64>,
    pub center_x: Option<f64>,
    pub center_y: Option<f64>,
    pub marker: u8,
}

/// Outcome of one batch run.
///
/// The compact `Display` form gives the three counts; the alternate form
/// (`{:#}`) lists every file with its status.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Per-file outcomes keyed by keypoint-table path.
    pub outcomes: BatchOutcomes,
    /// Tables that could not be paired with a video (not failures).
    pub skipped: Vec<Utf8PathBuf>,
}

impl BatchSummary {
    pub fn n_processed(&self) -> usize {
        self.outcomes.values().filter(|r| r.is_ok()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.outcomes.values().filter(|r| r.is_err()).count()
    }

    pub fn n_skipped(&self) -> usize {
        self.skipped.len()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} processed, {} failed, {} skipped",
            self.n_processed(),
            self.n_failed(),
            self.n_skipped()
        )?;
        if f.alternate() {
            let mut paths: Vec<&Utf8PathBuf> = self.outcomes.keys().collect();
            paths.sort();
            for path in paths {
                match &self.outcomes[path] {
                    Ok(()) => write!(f, "\n  processed: {path}")?,
                    Err(e) => write!(f, "\n  failed: {path} ({e})")?,
                }
            }
            let mut skipped: Vec<&Utf8PathBuf> = self.skipped.iter().collect();
            skipped.sort();
            for path in skipped {
                write!(f, "\n  skipped: {path} (no paired video)")?;
            }
        }
        Ok(())
    }
}

/// Drives the full pipeline over every keypoint table in the tracked
/// directory.
pub struct BatchRunner {
    layout: DataLayout,
    options: RunOptions,
}

impl BatchRunner {
    pub fn new(layout: DataLayout, options: RunOptions) -> Self {
        Self { layout, options }
    }

    /// Process every pairable `.csv` in the tracked directory.
    ///
    /// Errors inside one file's processing are recorded in the summary and
    /// never abort the batch; only filesystem faults outside any file's
    /// boundary (unreadable tracked directory, failed bootstrap) abort.
    pub fn run(&self) -> Result<BatchSummary, PupillometryError> {
        self.layout.ensure_directories()?;

        let mut tables: Vec<Utf8PathBuf> = Vec::new();
        for entry in std::fs::read_dir(self.layout.tracked.as_std_path())? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = Utf8PathBuf::from_path_buf(entry.path())
                .map_err(|p| PupillometryError::Utf8PathError(p.display().to_string()))?;
            if path.extension() == Some("csv") {
                tables.push(path);
            }
        }
        tables.sort();
        info!(
            n_tables = tables.len(),
            tracked = %self.layout.tracked,
            "starting batch"
        );

        let mut summary = BatchSummary::default();
        for table_path in tables {
            let stem = match table_path.file_stem() {
                Some(stem) => stem,
                None => {
                    warn!(table = %table_path, "no file stem, skipping");
                    summary.skipped.push(table_path);
                    continue;
                }
            };
            let Some(pattern) = derived_pattern(stem) else {
                warn!(table = %table_path, "no model-suffix marker in filename, skipping");
                summary.skipped.push(table_path);
                continue;
            };
            let video = match choose_video(&self.layout.video, pattern)? {
                Some(video) => video,
                None => {
                    warn!(table = %table_path, pattern, "no paired video, skipping");
                    summary.skipped.push(table_path);
                    continue;
                }
            };

            let outcome = self
                .process_file(&table_path, &video, pattern)
                .and_then(|()| self.archive_table(&table_path));
            match &outcome {
                Ok(()) => info!(table = %table_path, "file processed"),
                Err(e) => error!(table = %table_path, error = %e, "file failed"),
            }
            summary.outcomes.insert(table_path, outcome);
        }

        info!(%summary, "batch finished");
        Ok(summary)
    }

    /// Full pipeline for one table/video pair.
    fn process_file(
        &self,
        table_path: &Utf8Path,
        video_path: &Utf8Path,
        pattern: &str,
    ) -> Result<(), PupillometryError> {
        info!(table = %table_path, video = %video_path, "processing pair");

        let table = read_table(table_path)?;
        let masked = mask_low_likelihood(&table, self.options.likelihood_threshold);
        let filled = interpolate_linear(&masked);
        persist_artifacts(&masked, &filled, &self.layout.interpolated, pattern)?;

        let groups = filled.bodypart_groups(&self.options.target_bodypart);
        if groups.is_empty() {
            return Err(PupillometryError::BodypartNotFound(
                self.options.target_bodypart.clone(),
            ));
        }

        let mut reader = VideoReader::open(video_path)?;
        let n_frames = reader.frame_count()?;
        if n_frames != filled.n_frames() {
            return Err(PupillometryError::FrameCountMismatch {
                table_rows: filled.n_frames(),
                video_frames: n_frames,
            });
        }

        let video_stem = video_path
            .file_stem()
            .ok_or_else(|| PupillometryError::Utf8PathError(video_path.to_string()))?;
        let mut sink = if self.options.create_video {
            let out = self
                .layout
                .video
                .join(format!("{video_stem}{ANNOTATED_SUFFIX}.mp4"));
            Some(VideoSink::create(&out, reader.fps()?, reader.frame_size()?)?)
        } else {
            None
        };

        #[cfg(feature = "progress")]
        let bar = indicatif::ProgressBar::new(n_frames as u64);

        let mut rows = Vec::with_capacity(n_frames);
        for frame_idx in 0..n_frames {
            let mut frame = reader.read_frame(frame_idx)?;
            let cloud = filled.point_cloud(frame_idx, &groups);
            let fit = fit_ellipse(&cloud);
            let marker = self.options.marker.is_marked(&frame)? as u8;

            rows.push(match &fit {
                Some(p) => ResultRow {
                    area: Some(p.area()),
                    center_x: Some(p.center_x),
                    center_y: Some(p.center_y),
                    marker,
                },
                None => ResultRow {
                    area: None,
                    center_x: None,
                    center_y: None,
                    marker,
                },
            });

            if sink.is_some() || self.options.show_video {
                if let Some(p) = &fit {
                    draw_ellipse(&mut frame, p, annotation_color(), ANNOTATION_THICKNESS)?;
                }
            }
            if let Some(sink) = sink.as_mut() {
                sink.write(&frame)?;
            }
            if self.options.show_video {
                highgui::imshow(PREVIEW_WINDOW, &frame)?;
                if highgui::wait_key(1)? == b'q' as i32 {
                    highgui::destroy_all_windows()?;
                    return Err(PupillometryError::PreviewInterrupted);
                }
            }

            if frame_idx > 0 && frame_idx % PROGRESS_LOG_EVERY == 0 {
                info!(frame = frame_idx, total = n_frames, "frames processed");
            }
            #[cfg(feature = "progress")]
            bar.inc(1);
        }

        #[cfg(feature = "progress")]
        bar.finish_and_clear();
        if self.options.show_video {
            highgui::destroy_all_windows()?;
        }

        self.write_results(video_stem, &rows)
    }

    /// Write the per-frame result table under the area directory.
    fn write_results(&self, video_stem: &str, rows: &[ResultRow]) -> Result<(), PupillometryError> {
        let path = self.layout.area.join(format!("{video_stem}.csv"));
        let file = std::fs::File::create(path.as_std_path())?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);

        let bp = &self.options.target_bodypart;
        writer.write_record([
            format!("{bp}-area"),
            format!("{bp}-x"),
            format!("{bp}-y"),
            "marker-flag".to_owned(),
        ])?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        info!(results = %path, n_rows = rows.len(), "wrote result table");
        Ok(())
    }

    /// Move a fully processed keypoint table to the analyzed directory.
    fn archive_table(&self, table_path: &Utf8Path) -> Result<(), PupillometryError> {
        let name = table_path
            .file_name()
            .ok_or_else(|| PupillometryError::Utf8PathError(table_path.to_string()))?;
        let target = self.layout.analyzed.join(name);
        std::fs::rename(table_path.as_std_path(), target.as_std_path())?;
        Ok(())
    }
}
