use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{
    effects::{EffectConfig, NO_EFFECT},
    error::{ConfigError, Result},
    transitions::TransitionKind,
    video::types::{AspectRatio, Quality},
};

/// Shortest and longest time a slide may stay on screen (seconds)
pub const MIN_SLIDE_DURATION: f64 = 0.5;
pub const MAX_SLIDE_DURATION: f64 = 30.0;

/// Shortest and longest transition (seconds)
pub const MIN_TRANSITION_DURATION: f64 = 0.1;
pub const MAX_TRANSITION_DURATION: f64 = 5.0;

/// Supported output frame rates
pub const MIN_FPS: u32 = 15;
pub const MAX_FPS: u32 = 60;

/// Main configuration for the slideshow maker
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Global output settings used for new projects
    pub output: OutputSettings,

    /// Settings given to newly added images
    pub defaults: SlideDefaults,

    /// Renderer tuning
    pub render: RenderConfig,

    /// Parameters shared by all effects
    pub effect: EffectConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::InvalidValue {
            key: "config".to_string(),
            value: e.to_string(),
        })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.output.validate()?;
        self.defaults.validate()?;
        self.render.validate()?;

        if !(0.0..=1.0).contains(&self.effect.intensity) {
            return Err(ConfigError::InvalidValue {
                key: "effect.intensity".to_string(),
                value: self.effect.intensity.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Global video settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output aspect ratio
    pub aspect_ratio: AspectRatio,

    /// Length of the short side in pixels
    pub base_height: u32,

    /// Frames per second
    pub fps: u32,

    /// Fraction of each start transition that overlaps the previous slide
    /// (0.0 = slides play back to back, 1.0 = the whole transition overlaps)
    pub overlap: f64,

    /// Bitrate preset
    pub quality: Quality,

    /// ffmpeg video codec
    pub codec: String,

    /// ffmpeg encoder preset
    pub preset: String,

    /// Threads handed to the encoder
    pub encoder_threads: usize,

    /// Letterbox and background color
    pub background: [u8; 3],
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: AspectRatio::default(),
            base_height: 1080,
            fps: 30,
            overlap: 0.5,
            quality: Quality::default(),
            codec: "libx264".to_string(),
            preset: "medium".to_string(),
            encoder_threads: 4,
            background: [0, 0, 0],
        }
    }
}

impl OutputSettings {
    /// Output frame size in pixels
    pub fn resolution(&self) -> (u32, u32) {
        self.aspect_ratio.dimensions(self.base_height)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_FPS..=MAX_FPS).contains(&self.fps) {
            return Err(ConfigError::InvalidValue {
                key: "output.fps".to_string(),
                value: self.fps.to_string(),
            }
            .into());
        }

        if !(0.0..=1.0).contains(&self.overlap) {
            return Err(ConfigError::InvalidValue {
                key: "output.overlap".to_string(),
                value: self.overlap.to_string(),
            }
            .into());
        }

        if !(16..=4320).contains(&self.base_height) {
            return Err(ConfigError::InvalidValue {
                key: "output.base_height".to_string(),
                value: self.base_height.to_string(),
            }
            .into());
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "output.codec".to_string(),
                value: self.codec.clone(),
            }
            .into());
        }

        if self.encoder_threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "output.encoder_threads".to_string(),
                value: self.encoder_threads.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Settings given to each image when it is added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideDefaults {
    pub duration: f64,
    pub start_transition: TransitionKind,
    pub start_duration: f64,
    pub end_transition: TransitionKind,
    pub end_duration: f64,
    pub effect: String,
}

impl Default for SlideDefaults {
    fn default() -> Self {
        Self {
            duration: 3.0,
            start_transition: TransitionKind::Fade,
            start_duration: 1.0,
            end_transition: TransitionKind::Fade,
            end_duration: 1.0,
            effect: NO_EFFECT.to_string(),
        }
    }
}

impl SlideDefaults {
    fn validate(&self) -> Result<()> {
        if !(MIN_SLIDE_DURATION..=MAX_SLIDE_DURATION).contains(&self.duration) {
            return Err(ConfigError::InvalidValue {
                key: "defaults.duration".to_string(),
                value: self.duration.to_string(),
            }
            .into());
        }

        for (key, value) in [
            ("defaults.start_duration", self.start_duration),
            ("defaults.end_duration", self.end_duration),
        ] {
            if !(MIN_TRANSITION_DURATION..=MAX_TRANSITION_DURATION).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                }
                .into());
            }
        }

        Ok(())
    }
}

/// Renderer tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Worker threads used for decoding and rendering
    pub threads: usize,

    /// Frames rendered in parallel before being handed to the encoder
    pub batch_size: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let threads = num_cpus::get();
        Self {
            threads,
            batch_size: (threads * 2).max(4),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.threads".to_string(),
                value: self.threads.to_string(),
            }
            .into());
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.batch_size".to_string(),
                value: self.batch_size.to_string(),
            }
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original = Config::default();
        original.output.aspect_ratio = AspectRatio::Portrait;
        original.defaults.end_transition = "Slide Out Left".parse().unwrap();

        original.save_to_file(&file_path).unwrap();
        let loaded = Config::from_file(&file_path).unwrap();

        assert_eq!(loaded.output, original.output);
        assert_eq!(loaded.defaults, original.defaults);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[output]\naspect_ratio = \"4:3\"\nfps = 24\n\n[defaults]\neffect = \"Zoom In\"\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(config.output.aspect_ratio, AspectRatio::Standard);
        assert_eq!(config.output.fps, 24);
        assert_eq!(config.output.quality, Quality::High);
        assert_eq!(config.defaults.effect, "Zoom In");
        assert_eq!(config.defaults.duration, 3.0);
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("/definitely/not/here.toml").is_err());
    }

    #[test]
    fn test_invalid_fps() {
        let mut config = Config::default();
        config.output.fps = 120;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_overlap() {
        let mut config = Config::default();
        config.output.overlap = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_default_duration() {
        let mut config = Config::default();
        config.defaults.duration = 0.1;
        assert!(config.validate().is_err());
    }
}
