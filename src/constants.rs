//! # Constants and type definitions for the pupillometry pipeline
//!
//! This module centralizes the **numeric defaults** and **common type
//! definitions** used throughout the crate. It also defines the container
//! type used to collect per-file batch outcomes.
//!
//! ## Overview
//!
//! - Confidence and fitting thresholds
//! - Filename conventions tying keypoint tables to videos
//! - Default marker-pixel specification
//! - Core type aliases used across the crate

use std::collections::HashMap;

use camino::Utf8PathBuf;

use crate::pupillometry_errors::PupillometryError;

// -------------------------------------------------------------------------------------------------
// Thresholds and defaults
// -------------------------------------------------------------------------------------------------

/// Minimum per-point likelihood below which a tracked (x, y) pair is discarded
pub const LIKELIHOOD_THRESHOLD: f64 = 0.9;

/// Minimum number of valid points required to attempt an ellipse fit.
///
/// A frame with 3 or fewer valid points yields no fit (absence, not an error).
pub const MIN_FIT_POINTS: usize = 4;

/// Marker appended by the upstream tracker to keypoint-table filenames.
///
/// The stem prefix before this marker identifies the source video.
pub const MODEL_SUFFIX_MARKER: &str = "DLC";

/// Suffix appended to the video stem for the annotated output video
pub const ANNOTATED_SUFFIX: &str = "-ellipse";

/// Frame cadence for per-frame progress logging inside the batch loop
pub const PROGRESS_LOG_EVERY: usize = 5000;

/// Default marker-pixel position as (row, col)
pub const MARKER_PIXEL: (i32, i32) = (10, 10);

/// Default inclusive lower BGR bound for the marker color
pub const MARKER_LOWER: [u8; 3] = [0, 0, 235];

/// Default inclusive upper BGR bound for the marker color
pub const MARKER_UPPER: [u8; 3] = [20, 20, 255];

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in radians
pub type Radian = f64;
/// Pixel coordinate (sub-pixel precision)
pub type PixelCoord = f64;
/// Per-point confidence score from the upstream tracker, in (0, 1)
pub type Likelihood = f64;
/// Zero-based video/table frame index
pub type FrameIndex = usize;

/// Per-file batch outcomes, keyed by keypoint-table path.
///
/// `Ok(())` marks a fully processed file; `Err` carries the fault that
/// aborted that file. Failures are per-file and never abort the batch.
pub type BatchOutcomes = HashMap<Utf8PathBuf, Result<(), PupillometryError>, ahash::RandomState>;
