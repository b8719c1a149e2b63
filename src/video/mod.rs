//! # Video I/O and frame annotation
//!
//! Thin OpenCV layer for the per-frame loop: [`reader::VideoReader`] wraps
//! capture with frame-count/fps/size introspection, [`reader::VideoSink`]
//! wraps the annotated-output writer, [`annotate`] draws fitted ellipses and
//! [`marker`] samples the stimulus-marker pixel.
//!
//! Capture and writer handles release their OpenCV resources on drop, so
//! early returns out of the frame loop (including a preview interrupt) leave
//! no dangling file handles.

pub mod annotate;
pub mod marker;
pub mod reader;

pub use annotate::draw_ellipse;
pub use marker::MarkerSpec;
pub use reader::{VideoReader, VideoSink};
