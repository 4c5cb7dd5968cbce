//! # Slide Effects
//!
//! Effects modify a slide while it is on screen. Each effect is self-contained
//! and looked up by name through the [`EffectRegistry`].
//!
//! ## Built-in Effects
//!
//! - **Zoom In / Zoom Out**: slow magnification toward or away from the center
//! - **Pan**: camera travel across the image in one of four directions
//! - **Sepia / Grayscale**: color grading
//! - **Blur**: gaussian softening
//!
//! ## Usage
//!
//! ```rust,no_run
//! use slideshow_maker::effects::{EffectConfig, EffectRegistry};
//! use slideshow_maker::video::Frame;
//!
//! let registry = EffectRegistry::new();
//! let zoom = registry.get_effect("Zoom In").unwrap();
//!
//! let mut frame = Frame::new_filled(320, 180, [40, 80, 120]);
//! zoom.apply_effect(&mut frame, 0.5, &EffectConfig::default()).unwrap();
//! ```

pub mod registry;
pub mod traits;

mod sampling;

// Effect implementations
pub mod blur;
pub mod color;
pub mod pan;
pub mod zoom;

pub use registry::{normalize_name, EffectRegistry, NO_EFFECT};
pub use traits::{ConfigValue, Effect, EffectConfig, EffectMetadata};

pub use blur::BlurEffect;
pub use color::{GrayscaleEffect, SepiaEffect};
pub use pan::{PanDirection, PanEffect};
pub use zoom::{ZoomDirection, ZoomEffect};

// Effect parameter keys
pub const ZOOM_AMOUNT: &str = "zoom_amount";
pub const PAN_SCALE: &str = "pan_scale";
pub const BLUR_SIGMA: &str = "blur_sigma";
pub const SEPIA_STRENGTH: &str = "sepia_strength";
