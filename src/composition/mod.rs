//! # Composition Engine
//!
//! The engine coordinates slide selection, image loading, the timeline and
//! frame rendering to turn a project into a finished slideshow.

pub mod engine;

pub use engine::{default_output_path, ensure_mp4_extension, RenderSummary, SlideshowEngine};
