use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use tracing::{debug, info, warn};

use crate::config::OutputSettings;
use crate::error::{Result, VideoError};
use crate::video::sink::{check_frame, FrameSink, SinkConfig};
use crate::video::types::Frame;

/// Encoder options for [`FfmpegSink`]
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderSettings {
    /// The ffmpeg executable, looked up on `PATH` unless absolute
    pub program: PathBuf,
    pub output_path: PathBuf,
    pub codec: String,
    pub preset: String,
    pub bitrate_kbps: u32,
    pub threads: usize,
}

impl EncoderSettings {
    pub fn from_output<P: Into<PathBuf>>(output_path: P, output: &OutputSettings) -> Self {
        Self {
            program: PathBuf::from("ffmpeg"),
            output_path: output_path.into(),
            codec: output.codec.clone(),
            preset: output.preset.clone(),
            bitrate_kbps: output.quality.bitrate_kbps(),
            threads: output.encoder_threads,
        }
    }
}

/// Whether `ffmpeg` can be invoked from `PATH`
pub fn check_ffmpeg_available() -> bool {
    check_program_available(Path::new("ffmpeg"))
}

fn check_program_available(program: &Path) -> bool {
    Command::new(program)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Streams raw RGB24 frames into an `ffmpeg` child process producing an MP4
pub struct FfmpegSink {
    settings: EncoderSettings,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    config: Option<SinkConfig>,
    last: Option<usize>,
}

impl FfmpegSink {
    pub fn new(settings: EncoderSettings) -> Self {
        Self {
            settings,
            child: None,
            stdin: None,
            stderr_drain: None,
            config: None,
            last: None,
        }
    }

    /// Command-line arguments passed to ffmpeg for a stream
    pub fn build_args(&self, config: &SinkConfig) -> Vec<String> {
        let s = &self.settings;
        let mut args: Vec<String> = [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgb24",
        ]
        .iter()
        .map(|a| a.to_string())
        .collect();

        args.extend([
            "-s".to_string(),
            format!("{}x{}", config.width, config.height),
            "-r".to_string(),
            config.fps.to_string(),
            "-i".to_string(),
            "pipe:0".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            s.codec.clone(),
            "-preset".to_string(),
            s.preset.clone(),
            "-b:v".to_string(),
            format!("{}k", s.bitrate_kbps),
            "-threads".to_string(),
            s.threads.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-movflags".to_string(),
            "+faststart".to_string(),
        ]);
        args.push(s.output_path.display().to_string());
        args
    }

    /// Close stdin, wait for ffmpeg to exit and collect its stderr
    fn finish_child(&mut self) -> Result<(ExitStatus, String)> {
        drop(self.stdin.take());

        let mut child = self.child.take().ok_or_else(|| VideoError::SinkFailed {
            reason: "ffmpeg sink not started".to_string(),
        })?;

        let status = child.wait()?;
        let stderr = match self.stderr_drain.take() {
            Some(handle) => handle
                .join()
                .map_err(|_| VideoError::EncodingFailed {
                    reason: "ffmpeg stderr reader panicked".to_string(),
                })??,
            None => Vec::new(),
        };

        Ok((status, String::from_utf8_lossy(&stderr).trim().to_string()))
    }

    fn ensure_parent_dir(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, config: &SinkConfig) -> Result<()> {
        if config.width == 0 || config.height == 0 || config.fps == 0 {
            return Err(VideoError::InvalidParameters {
                details: format!("{}x{} at {} fps", config.width, config.height, config.fps),
            }
            .into());
        }
        if config.width % 2 != 0 || config.height % 2 != 0 {
            return Err(VideoError::InvalidParameters {
                details: format!(
                    "yuv420p output needs even dimensions, got {}x{}",
                    config.width, config.height
                ),
            }
            .into());
        }

        if !check_program_available(&self.settings.program) {
            return Err(VideoError::EncodingFailed {
                reason: "FFmpeg not found. Please install FFmpeg.".to_string(),
            }
            .into());
        }

        Self::ensure_parent_dir(&self.settings.output_path)?;

        let args = self.build_args(config);
        debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.settings.program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::EncodingFailed {
                reason: format!("failed to start ffmpeg: {}", e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "failed to open ffmpeg stdin".to_string(),
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| VideoError::EncodingFailed {
            reason: "failed to open ffmpeg stderr".to_string(),
        })?;

        let stderr_drain = std::thread::spawn(move || {
            let mut bytes = Vec::new();
            stderr.read_to_end(&mut bytes)?;
            Ok(bytes)
        });

        info!(
            "Encoding {} frames to {:?} ({} @ {}k)",
            config.frame_count, self.settings.output_path, self.settings.codec, self.settings.bitrate_kbps
        );

        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.config = Some(config.clone());
        self.last = None;
        Ok(())
    }

    fn push_frame(&mut self, index: usize, frame: &Frame) -> Result<()> {
        check_frame(self.config.as_ref(), self.last, index, frame)?;
        self.last = Some(index);

        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::SinkFailed {
            reason: "ffmpeg sink already finished".to_string(),
        })?;

        let written = stdin.write_all(frame.as_bytes());
        if let Err(write_error) = written {
            // ffmpeg stopped reading, report its exit status and stderr
            let reason = match self.finish_child() {
                Ok((status, stderr)) if !stderr.is_empty() => {
                    format!("ffmpeg exited with {} at frame {}: {}", status, index, stderr)
                }
                Ok((status, _)) => {
                    format!("failed to write frame {} to ffmpeg ({}): {}", index, status, write_error)
                }
                Err(_) => format!("failed to write frame {} to ffmpeg: {}", index, write_error),
            };
            return Err(VideoError::EncodingFailed { reason }.into());
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let (status, stderr) = self.finish_child()?;

        if !status.success() {
            return Err(VideoError::EncodingFailed {
                reason: format!("ffmpeg exited with {}: {}", status, stderr),
            }
            .into());
        }

        let size = std::fs::metadata(&self.settings.output_path)
            .map(|m| m.len())
            .unwrap_or(0);
        info!(
            "Encoded {:?} ({:.1} MB)",
            self.settings.output_path,
            size as f64 / 1024.0 / 1024.0
        );

        self.config = None;
        Ok(())
    }

    fn abort(&mut self) -> Result<()> {
        let started = self.config.take().is_some();

        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                debug!("ffmpeg already exited: {}", e);
            }
            child.wait()?;
        }
        if let Some(handle) = self.stderr_drain.take() {
            if handle.join().is_err() {
                warn!("ffmpeg stderr reader panicked");
            }
        }

        if !started {
            return Ok(());
        }

        match std::fs::remove_file(&self.settings.output_path) {
            Ok(()) => {
                info!("Removed partial output {:?}", self.settings.output_path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
