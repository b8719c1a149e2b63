//! Capture and writer wrappers around `opencv::videoio`.

use camino::Utf8Path;
use opencv::core::{Mat, MatTraitConst, Size};
use opencv::videoio::{self, VideoCaptureTrait, VideoCaptureTraitConst, VideoWriterTrait, VideoWriterTraitConst};
use tracing::debug;

use crate::pupillometry_errors::PupillometryError;

/// Read-only capture handle for one source video.
///
/// Frames are consumed sequentially; the caller tracks the frame index and
/// passes it in for error reporting only.
pub struct VideoReader {
    cap: videoio::VideoCapture,
}

impl VideoReader {
    /// Open a video file, failing eagerly when the backend cannot decode it.
    pub fn open(path: &Utf8Path) -> Result<Self, PupillometryError> {
        let cap = videoio::VideoCapture::from_file(path.as_str(), videoio::CAP_ANY)?;
        if !cap.is_opened()? {
            return Err(PupillometryError::VideoOpenFailed(path.to_string()));
        }
        debug!(video = %path, "opened capture");
        Ok(Self { cap })
    }

    /// Total frame count as reported by the container.
    pub fn frame_count(&self) -> Result<usize, PupillometryError> {
        Ok(self.cap.get(videoio::CAP_PROP_FRAME_COUNT)? as usize)
    }

    pub fn fps(&self) -> Result<f64, PupillometryError> {
        Ok(self.cap.get(videoio::CAP_PROP_FPS)?)
    }

    pub fn frame_size(&self) -> Result<Size, PupillometryError> {
        let width = self.cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as i32;
        let height = self.cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as i32;
        Ok(Size::new(width, height))
    }

    /// Read the next frame; `index` names the expected frame for diagnostics.
    pub fn read_frame(&mut self, index: usize) -> Result<Mat, PupillometryError> {
        let mut frame = Mat::default();
        if !self.cap.read(&mut frame)? || frame.empty() {
            return Err(PupillometryError::FrameReadFailure(index));
        }
        Ok(frame)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        let _ = self.cap.release();
    }
}

/// Writer handle for the annotated output video (mp4v, same fps and size as
/// the source).
pub struct VideoSink {
    writer: videoio::VideoWriter,
}

impl VideoSink {
    pub fn create(path: &Utf8Path, fps: f64, size: Size) -> Result<Self, PupillometryError> {
        let fourcc = videoio::VideoWriter::fourcc('m', 'p', '4', 'v')?;
        let writer = videoio::VideoWriter::new(path.as_str(), fourcc, fps, size, true)?;
        if !writer.is_opened()? {
            return Err(PupillometryError::WriterOpenFailed(path.to_string()));
        }
        debug!(video = %path, fps, "opened annotated-video writer");
        Ok(Self { writer })
    }

    pub fn write(&mut self, frame: &Mat) -> Result<(), PupillometryError> {
        self.writer.write(frame)?;
        Ok(())
    }
}

impl Drop for VideoSink {
    fn drop(&mut self) {
        let _ = self.writer.release();
    }
}
