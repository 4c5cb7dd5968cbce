//! # Video Rendering Module
//!
//! Frames and output formats, the slide timeline, the frame renderer, and the
//! sinks that receive rendered frames (ffmpeg, PNG sequence, memory).

pub mod encoder;
pub mod renderer;
pub mod sink;
pub mod timeline;
pub mod types;

pub use encoder::{check_ffmpeg_available, EncoderSettings, FfmpegSink};
pub use renderer::{FrameRenderer, PreparedSlide};
pub use sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use timeline::{format_time, SlideSpan, Timeline};
pub use types::{AspectRatio, Frame, Quality};
