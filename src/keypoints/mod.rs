//! # Keypoint tables: ingestion, storage, and per-frame slicing
//!
//! Facilities to **load**, **store**, and **reshape** tracked keypoint tables
//! produced by an upstream pose tracker. The central type is
//! [`KeypointTable`](table::KeypointTable): rows are video frames, columns are
//! identified by a `(bodypart, component)` key with an optional tracking-model
//! level that is stripped at load time.
//!
//! Modules
//! -----------------
//! * [`table`] – Column-major table storage, bodypart grouping, and per-frame
//!   point-cloud slicing.
//! * [`csv_reader`] – DeepLabCut-style CSV ingestion (2- or 3-level header)
//!   and the matching artifact writer.
//!
//! Data Model
//! -----------------
//! * **Column key:** bodypart label + component (`x`, `y`, or `likelihood`).
//! * **Storage:** one `Vec<f64>` per column, all of identical length; the
//!   column set is fixed after load and only filtered/reshaped into views.
//! * **Missing values:** `f64::NAN` — produced by the confidence gate or by
//!   interpolation boundary effects, never present in freshly tracked data.

pub mod csv_reader;
pub mod table;

pub use table::{BodypartColumns, Component, KeypointTable};
