use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::types::Frame;

/// Stream parameters handed to a sink before the first frame
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,

    /// Number of frames that will be pushed
    pub frame_count: usize,
}

/// Consumer of rendered frames.
///
/// `push_frame` is called in strictly increasing index order between one
/// `begin` and one `end`. When rendering fails part way, `abort` is called
/// instead of `end` and the sink discards whatever is incomplete.
pub trait FrameSink: Send {
    fn begin(&mut self, config: &SinkConfig) -> Result<()>;

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()>;

    fn end(&mut self) -> Result<()>;

    fn abort(&mut self) -> Result<()>;
}

/// Check that a pushed frame matches the stream it belongs to
pub(crate) fn check_frame(config: Option<&SinkConfig>, last: Option<usize>, index: usize, frame: &Frame) -> Result<()> {
    let config = config.ok_or_else(|| VideoError::SinkFailed {
        reason: "sink not started".to_string(),
    })?;

    if let Some(last) = last {
        if index <= last {
            return Err(VideoError::SinkFailed {
                reason: format!("frame {} pushed after frame {}", index, last),
            }
            .into());
        }
    }

    if frame.width() != config.width || frame.height() != config.height {
        return Err(VideoError::FrameProcessingFailed {
            reason: format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width(),
                frame.height(),
                config.width,
                config.height
            ),
        }
        .into());
    }

    Ok(())
}

/// Keeps every frame in memory
#[derive(Debug, Default)]
pub struct InMemorySink {
    config: Option<SinkConfig>,
    frames: Vec<(usize, Frame)>,
    finished: bool,
    aborted: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<&SinkConfig> {
        self.config.as_ref()
    }

    pub fn frames(&self) -> &[(usize, Frame)] {
        &self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, config: &SinkConfig) -> Result<()> {
        self.config = Some(config.clone());
        self.frames.clear();
        self.finished = false;
        self.aborted = false;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        check_frame(self.config.as_ref(), self.frames.last().map(|(i, _)| *i), index, frame)?;
        self.frames.push((index, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        self.aborted = true;
        Ok(())
    }
}

/// Writes each frame as `frame_000000.png` into a directory
pub struct PngSequenceSink {
    dir: PathBuf,
    config: Option<SinkConfig>,
    last: Option<usize>,
    written: usize,
}

impl PngSequenceSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            config: None,
            last: None,
            written: 0,
        }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame_{:06}.png", index))
    }

    pub fn frames_written(&self) -> usize {
        self.written
    }
}

impl FrameSink for PngSequenceSink {
    fn begin(&mut self, config: &SinkConfig) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;
        debug!("Writing PNG frames to {:?}", self.dir);

        self.config = Some(config.clone());
        self.last = None;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        check_frame(self.config.as_ref(), self.last, index, frame)?;

        let path = self.frame_path(index);
        frame.save_png(&path).map_err(|e| VideoError::SinkFailed {
            reason: format!("failed to save {}: {}", path.display(), e),
        })?;

        self.last = Some(index);
        self.written += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        info!("Saved {} frames to {:?}", self.written, self.dir);
        self.config = None;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        warn!(
            "Frame export stopped after {} frames, partial sequence left in {:?}",
            self.written, self.dir
        );
        self.config = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config() -> SinkConfig {
        SinkConfig {
            width: 4,
            height: 2,
            fps: 30,
            frame_count: 2,
        }
    }

    #[test]
    fn test_in_memory_sink_keeps_order() {
        let mut sink = InMemorySink::new();
        sink.begin(&config()).unwrap();
        sink.push_frame(0, &Frame::new_black(4, 2)).unwrap();
        sink.push_frame(1, &Frame::new_black(4, 2)).unwrap();
        assert!(sink.push_frame(1, &Frame::new_black(4, 2)).is_err());
        sink.end().unwrap();

        assert_eq!(sink.frames().len(), 2);
        assert!(sink.is_finished());
        assert!(!sink.is_aborted());
    }

    #[test]
    fn test_aborted_png_sequence_keeps_written_frames() {
        let dir = tempdir().unwrap();
        let mut sink = PngSequenceSink::new(dir.path());
        sink.begin(&config()).unwrap();
        sink.push_frame(0, &Frame::new_black(4, 2)).unwrap();
        sink.abort().unwrap();

        assert_eq!(sink.frames_written(), 1);
        assert!(sink.frame_path(0).exists());
        assert!(sink.push_frame(1, &Frame::new_black(4, 2)).is_err());
    }

    #[test]
    fn test_rejects_wrong_size_and_unstarted() {
        let mut sink = InMemorySink::new();
        assert!(sink.push_frame(0, &Frame::new_black(4, 2)).is_err());

        sink.begin(&config()).unwrap();
        assert!(sink.push_frame(0, &Frame::new_black(8, 8)).is_err());
    }

    #[test]
    fn test_png_sequence() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("frames");

        let mut sink = PngSequenceSink::new(&out);
        sink.begin(&config()).unwrap();
        sink.push_frame(0, &Frame::new_filled(4, 2, [10, 20, 30])).unwrap();
        sink.push_frame(1, &Frame::new_black(4, 2)).unwrap();
        sink.end().unwrap();

        assert_eq!(sink.frames_written(), 2);
        let first = image::open(out.join("frame_000000.png")).unwrap().to_rgb8();
        assert_eq!(first.get_pixel(3, 1).0, [10, 20, 30]);
        assert!(out.join("frame_000001.png").exists());
    }
}
