use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{
    config::{
        SlideDefaults, MAX_SLIDE_DURATION, MAX_TRANSITION_DURATION, MIN_SLIDE_DURATION,
        MIN_TRANSITION_DURATION,
    },
    error::{ImageError, Result},
    overlay::Overlay,
    transitions::{SlideTransitions, TransitionKind},
};

/// One image in the slideshow together with its display settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageItem {
    /// Path to the image file
    pub path: PathBuf,

    /// Time on screen in seconds, transitions included
    pub duration: f64,

    pub start_transition: TransitionKind,
    pub start_duration: f64,

    pub end_transition: TransitionKind,
    pub end_duration: f64,

    /// Effect name, `none` for no effect
    pub effect: String,

    #[serde(skip_serializing_if = "Overlay::is_none")]
    pub overlay: Overlay,
}

impl Default for ImageItem {
    fn default() -> Self {
        Self::with_defaults(PathBuf::new(), &SlideDefaults::default())
    }
}

impl ImageItem {
    /// Create an item with the built-in default settings
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_defaults(path, &SlideDefaults::default())
    }

    /// Create an item using configured defaults
    pub fn with_defaults<P: Into<PathBuf>>(path: P, defaults: &SlideDefaults) -> Self {
        Self {
            path: path.into(),
            duration: defaults.duration,
            start_transition: defaults.start_transition,
            start_duration: defaults.start_duration,
            end_transition: defaults.end_transition,
            end_duration: defaults.end_duration,
            effect: defaults.effect.clone(),
            overlay: Overlay::None,
        }
    }

    /// File name without the directory
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Time the slide occupies before any overlap with its neighbours
    pub fn total_duration(&self) -> f64 {
        self.duration
    }

    /// Effective start and end transitions, fitted into the slide duration
    pub fn transitions(&self) -> SlideTransitions {
        SlideTransitions::resolve(
            self.start_transition,
            self.start_duration,
            self.end_transition,
            self.end_duration,
            self.duration,
        )
    }

    /// Resolve relative image and watermark paths against `base`
    pub fn resolve_path(&mut self, base: &Path) {
        if self.path.is_relative() {
            self.path = base.join(&self.path);
        }
        self.overlay.resolve_path(base);
    }

    /// Replace the image path and any overlay file path
    pub fn map_paths<F: Fn(&Path) -> PathBuf>(&mut self, f: F) {
        self.path = f(&self.path);
        self.overlay.map_paths(&f);
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |details: String| -> crate::error::SlideshowError {
            ImageError::InvalidSettings {
                path: self.path.display().to_string(),
                details,
            }
            .into()
        };

        if self.path.as_os_str().is_empty() {
            return Err(invalid("image path is empty".to_string()));
        }

        if !(MIN_SLIDE_DURATION..=MAX_SLIDE_DURATION).contains(&self.duration) {
            return Err(invalid(format!(
                "duration {}s is outside {}-{}s",
                self.duration, MIN_SLIDE_DURATION, MAX_SLIDE_DURATION
            )));
        }

        for (label, kind, value) in [
            ("start", self.start_transition, self.start_duration),
            ("end", self.end_transition, self.end_duration),
        ] {
            if !kind.is_none()
                && !(MIN_TRANSITION_DURATION..=MAX_TRANSITION_DURATION).contains(&value)
            {
                return Err(invalid(format!(
                    "{} transition duration {}s is outside {}-{}s",
                    label, value, MIN_TRANSITION_DURATION, MAX_TRANSITION_DURATION
                )));
            }
        }

        Ok(())
    }
}

impl std::fmt::Display for ImageItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}s)", self.file_name(), self.duration)
    }
}
