//! # Slideshow Maker
//!
//! Turn a folder of photos into an MP4 slideshow with transitions, effects and
//! overlays.
//!
//! Each image stays on screen for its own duration, enters and leaves with a
//! fade or slide transition, and can carry an animated effect (zoom, pan) or a
//! color grade. Consecutive slides overlap so their transitions blend.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use slideshow_maker::{
//!     composition::SlideshowEngine,
//!     config::Config,
//!     slides::{ImageLoader, Project},
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let images = ImageLoader::discover("photos/")?;
//! let project = Project::from_images(images, &config);
//!
//! let engine = SlideshowEngine::new(config);
//! engine.render(&project, "holiday.mp4").await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`slides`] - Image items, the slide list, image loading and project files
//! - [`transitions`] - Start and end transitions and their per-frame state
//! - [`effects`] - Zoom, pan, color and blur effects
//! - [`overlay`] - Watermarks and borders
//! - [`profiles`] - Named presets and the selection modes
//! - [`video`] - Timeline, frame rendering and output sinks
//! - [`composition`] - The engine driving the whole pipeline
//! - [`config`] - Configuration management
//!
//! ## Custom Effects
//!
//! Implement the [`Effect`](effects::Effect) trait and register it:
//!
//! ```rust,no_run
//! use slideshow_maker::effects::{Effect, EffectConfig, EffectRegistry};
//! use slideshow_maker::video::Frame;
//! use slideshow_maker::Result;
//!
//! struct Invert;
//!
//! impl Effect for Invert {
//!     fn name(&self) -> &str { "invert" }
//!     fn label(&self) -> &str { "Invert" }
//!     fn description(&self) -> &str { "Negative image" }
//!
//!     fn apply_effect(&self, frame: &mut Frame, _progress: f32, _config: &EffectConfig) -> Result<()> {
//!         for byte in frame.as_image_mut().iter_mut() {
//!             *byte = 255 - *byte;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut registry = EffectRegistry::new();
//! registry.register("invert", || Box::new(Invert));
//! ```

pub mod composition;
pub mod config;
pub mod effects;
pub mod error;
pub mod overlay;
pub mod profiles;
pub mod slides;
pub mod transitions;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::SlideshowEngine,
    config::Config,
    effects::{Effect, EffectRegistry},
    error::{Result, SlideshowError},
    profiles::{ProfileRegistry, SelectionMode},
    slides::{ImageItem, Project, SlideList},
    transitions::TransitionKind,
};
