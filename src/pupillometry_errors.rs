use thiserror::Error;

/// Faults that abort processing of a single file pair (or the whole batch,
/// for filesystem-level errors raised outside any file's boundary).
///
/// Absence conditions — too few valid points or a numerically degenerate
/// ellipse fit — are deliberately **not** represented here: they are local,
/// per-frame `None` results and never raised as errors.
#[derive(Error, Debug)]
pub enum PupillometryError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("OpenCV error: {0}")]
    OpenCvError(#[from] opencv::Error),

    #[error("UTF-8 path error: {0}")]
    Utf8PathError(String),

    #[error("Invalid keypoint table header: {0}")]
    InvalidTableHeader(String),

    #[error("Row {row} has {got} fields, expected {expected}")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    #[error("Invalid numeric cell at row {row}, column {column}: {value:?}")]
    InvalidCell {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("Unable to open video: {0}")]
    VideoOpenFailed(String),

    #[error("Unable to open video writer: {0}")]
    WriterOpenFailed(String),

    #[error("Keypoint table has {table_rows} rows but the video has {video_frames} frames")]
    FrameCountMismatch {
        table_rows: usize,
        video_frames: usize,
    },

    #[error("Video frame {0} could not be read")]
    FrameReadFailure(usize),

    #[error("No tracked bodypart matches {0:?}")]
    BodypartNotFound(String),

    #[error("Preview interrupted by user")]
    PreviewInterrupted,
}
