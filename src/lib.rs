//! # Pupillometry pipeline
//!
//! Batch processing of tracked eye-keypoint tables: per-frame confidence
//! gating and interpolation ([`interpolation`]), direct least-squares
//! ellipse fitting and area derivation ([`ellipse`]), video annotation and
//! stimulus-marker detection ([`video`]), all driven by the supervised
//! batch loop in [`batch`].
//!
//! Input tables are DeepLabCut-style CSVs ([`keypoints`]); outputs are one
//! result row per video frame (area, center, marker flag) plus the masked
//! and interpolated table artifacts.

pub mod batch;
pub mod constants;
pub mod ellipse;
pub mod interpolation;
pub mod keypoints;
pub mod pupillometry_errors;
pub mod video;

pub use batch::config::DataLayout;
pub use batch::run::{BatchRunner, BatchSummary, ResultRow, RunOptions};
pub use ellipse::EllipseParams;
pub use keypoints::table::KeypointTable;
pub use pupillometry_errors::PupillometryError;
pub use video::marker::MarkerSpec;
