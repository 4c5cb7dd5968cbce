use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{error::Result, video::types::Frame};

/// Core trait that all slide effects must implement
pub trait Effect: Send + Sync {
    /// Returns the unique, normalized name of this effect (e.g. `zoom_in`)
    fn name(&self) -> &str;

    /// Returns the display label of this effect (e.g. `Zoom In`)
    fn label(&self) -> &str;

    /// Returns a human-readable description of this effect
    fn description(&self) -> &str;

    /// Apply the effect to a slide frame
    ///
    /// # Arguments
    ///
    /// * `frame` - The fitted slide image to modify in-place
    /// * `progress` - Position within the slide, 0.0 at its first frame and 1.0 at its last
    /// * `config` - Effect parameters
    fn apply_effect(&self, frame: &mut Frame, progress: f32, config: &EffectConfig) -> Result<()>;

    /// Whether the output depends on `progress`.
    ///
    /// Static effects are applied once per slide and the result is reused for
    /// every frame.
    fn is_animated(&self) -> bool {
        false
    }

    /// Validate that the given configuration is valid for this effect
    fn validate_config(&self, config: &EffectConfig) -> Result<()> {
        let _ = config;
        Ok(())
    }

    /// Get effect-specific metadata
    fn metadata(&self) -> EffectMetadata {
        EffectMetadata::default()
    }
}

/// Configuration for slide effects
///
/// A shared intensity plus effect-specific parameters keyed by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectConfig {
    /// Intensity of the effect (0.0 = none, 1.0 = full intensity)
    pub intensity: f32,

    /// Effect-specific parameters
    pub parameters: HashMap<String, ConfigValue>,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            intensity: 1.0,
            parameters: HashMap::new(),
        }
    }
}

impl EffectConfig {
    /// Create a new config with the given intensity
    pub fn with_intensity(intensity: f32) -> Self {
        Self {
            intensity: intensity.clamp(0.0, 1.0),
            parameters: HashMap::new(),
        }
    }

    /// Set a parameter value
    pub fn set<K: Into<String>, V: Into<ConfigValue>>(mut self, key: K, value: V) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.parameters.get(key).and_then(|v| v.as_f32())
    }

    /// Get a parameter value with a default
    pub fn get_f32_or(&self, key: &str, default: f32) -> f32 {
        self.get_f32(key).unwrap_or(default)
    }
}

/// Flexible configuration value that can hold different types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Float(f32),
    Bool(bool),
    String(String),
    Integer(i32),
}

impl ConfigValue {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            ConfigValue::Float(f) => Some(*f),
            ConfigValue::Integer(i) => Some(*i as f32),
            _ => None,
        }
    }
}

impl From<f32> for ConfigValue {
    fn from(value: f32) -> Self {
        ConfigValue::Float(value)
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::String(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::String(value.to_string())
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        ConfigValue::Integer(value)
    }
}

/// Metadata about an effect's characteristics
#[derive(Debug, Clone, Default)]
pub struct EffectMetadata {
    /// Estimated per-frame cost (0.0 = minimal, 1.0 = heavy)
    pub performance_impact: f32,

    /// List of optional parameters with descriptions
    pub optional_parameters: Vec<(String, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parameters() {
        let config = EffectConfig::default()
            .set("zoom_amount", 0.3)
            .set("steps", 4)
            .set("smooth", true);

        assert_eq!(config.get_f32("zoom_amount"), Some(0.3));
        assert_eq!(config.get_f32("steps"), Some(4.0));
        assert_eq!(config.get_f32("smooth"), None);
        assert_eq!(config.get_f32_or("missing", 1.5), 1.5);
    }

    #[test]
    fn test_intensity_is_clamped() {
        assert_eq!(EffectConfig::with_intensity(3.0).intensity, 1.0);
        assert_eq!(EffectConfig::with_intensity(-1.0).intensity, 0.0);
    }
}
