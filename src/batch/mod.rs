//! # Batch orchestration
//!
//! Walks the tracked-data directory, pairs each keypoint table with its
//! source video, and drives the full per-file pipeline: gate, interpolate,
//! fit, derive, optionally annotate, then persist results and archive the
//! consumed table.
//!
//! Failures are supervised per file: an error inside one pair's processing
//! is recorded against that file and the batch moves on. See
//! [`run::BatchRunner`].

pub mod config;
pub mod pairing;
pub mod run;

pub use config::DataLayout;
pub use run::{BatchRunner, BatchSummary, ResultRow, RunOptions};
