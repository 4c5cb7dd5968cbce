use std::collections::BTreeMap;

use crate::effects::{
    BlurEffect, Effect, GrayscaleEffect, PanDirection, PanEffect, SepiaEffect, ZoomDirection,
    ZoomEffect,
};

/// Name used for slides without an effect
pub const NO_EFFECT: &str = "none";

/// Normalize an effect name so `Pan Left to Right`, `pan-left-to-right` and
/// `pan_left_to_right` all refer to the same effect.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

type EffectFactory = Box<dyn Fn() -> Box<dyn Effect> + Send + Sync>;

/// Registry for managing available slide effects
///
/// Effects are registered by normalized name and instantiated on demand.
pub struct EffectRegistry {
    effects: BTreeMap<String, EffectFactory>,
}

impl EffectRegistry {
    /// Create a new effect registry with all built-in effects
    pub fn new() -> Self {
        let mut registry = Self {
            effects: BTreeMap::new(),
        };

        registry.register_builtin_effects();
        registry
    }

    fn register_builtin_effects(&mut self) {
        self.register("zoom_in", || Box::new(ZoomEffect::new(ZoomDirection::In)));
        self.register("zoom_out", || Box::new(ZoomEffect::new(ZoomDirection::Out)));

        self.register("pan_left_to_right", || {
            Box::new(PanEffect::new(PanDirection::LeftToRight))
        });
        self.register("pan_right_to_left", || {
            Box::new(PanEffect::new(PanDirection::RightToLeft))
        });
        self.register("pan_top_to_bottom", || {
            Box::new(PanEffect::new(PanDirection::TopToBottom))
        });
        self.register("pan_bottom_to_top", || {
            Box::new(PanEffect::new(PanDirection::BottomToTop))
        });

        self.register("sepia", || Box::new(SepiaEffect::new()));
        self.register("grayscale", || Box::new(GrayscaleEffect::new()));
        self.register("blur", || Box::new(BlurEffect::new()));
    }

    /// Register a custom effect
    ///
    /// # Arguments
    ///
    /// * `name` - Unique name for the effect, normalized before insertion
    /// * `factory` - Function that creates new instances of the effect
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn Effect> + Send + Sync + 'static,
    {
        self.effects.insert(normalize_name(name), Box::new(factory));
    }

    /// Get an effect by name
    ///
    /// Returns a new instance of the requested effect, or None if the effect
    /// is not registered. `none` is never registered.
    pub fn get_effect(&self, name: &str) -> Option<Box<dyn Effect>> {
        self.effects.get(&normalize_name(name)).map(|factory| factory())
    }

    /// All registered effect names in sorted order
    pub fn available_effects(&self) -> Vec<String> {
        self.effects.keys().cloned().collect()
    }

    /// Whether `name` resolves to a registered effect or to `none`
    pub fn is_known(&self, name: &str) -> bool {
        let normalized = normalize_name(name);
        normalized == NO_EFFECT || normalized.is_empty() || self.effects.contains_key(&normalized)
    }

    pub fn has_effect(&self, name: &str) -> bool {
        self.effects.contains_key(&normalize_name(name))
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectConfig, Effect};
    use crate::error::Result;
    use crate::video::Frame;

    #[test]
    fn test_builtin_effects_available() {
        let registry = EffectRegistry::new();

        assert!(registry.has_effect("zoom_in"));
        assert!(registry.has_effect("Zoom Out"));
        assert!(registry.has_effect("Pan Left to Right"));
        assert!(registry.has_effect("sepia"));
        assert!(registry.has_effect("grayscale"));
        assert!(registry.has_effect("blur"));

        assert_eq!(registry.len(), 9);
    }

    #[test]
    fn test_get_effect_by_label() {
        let registry = EffectRegistry::new();

        let pan = registry.get_effect("pan-bottom-to-top").unwrap();
        assert_eq!(pan.name(), "pan_bottom_to_top");
        assert_eq!(pan.label(), "Pan Bottom to Top");

        assert!(registry.get_effect("swirl").is_none());
        assert!(registry.get_effect(NO_EFFECT).is_none());
    }

    #[test]
    fn test_none_is_known() {
        let registry = EffectRegistry::new();
        assert!(registry.is_known("None"));
        assert!(registry.is_known("Blur"));
        assert!(!registry.is_known("swirl"));
    }

    #[test]
    fn test_metadata_lists_tunable_parameters() {
        let registry = EffectRegistry::new();
        let parameters = |name: &str| -> Vec<String> {
            registry
                .get_effect(name)
                .unwrap()
                .metadata()
                .optional_parameters
                .into_iter()
                .map(|(key, _)| key)
                .collect()
        };

        assert_eq!(parameters("zoom_in"), vec!["zoom_amount"]);
        assert_eq!(parameters("pan_left_to_right"), vec!["pan_scale"]);
        assert_eq!(parameters("sepia"), vec!["sepia_strength"]);
        assert_eq!(parameters("blur"), vec!["blur_sigma"]);
        assert!(parameters("grayscale").is_empty());
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Pan Left to Right "), "pan_left_to_right");
        assert_eq!(normalize_name("zoom-in"), "zoom_in");
        assert_eq!(normalize_name("None"), "none");
    }

    struct Invert;

    impl Effect for Invert {
        fn name(&self) -> &str {
            "invert"
        }

        fn label(&self) -> &str {
            "Invert"
        }

        fn description(&self) -> &str {
            "Photographic negative"
        }

        fn apply_effect(&self, frame: &mut Frame, _progress: f32, _config: &EffectConfig) -> Result<()> {
            let buffer: &mut [u8] = frame.as_image_mut();
            for value in buffer.iter_mut() {
                *value = 255 - *value;
            }
            Ok(())
        }
    }

    #[test]
    fn test_custom_effect_registration() {
        let mut registry = EffectRegistry::new();
        registry.register("Invert", || Box::new(Invert));

        assert!(registry.has_effect("invert"));
        assert_eq!(registry.len(), 10);

        let mut frame = Frame::new_filled(1, 1, [0, 10, 255]);
        registry
            .get_effect("invert")
            .unwrap()
            .apply_effect(&mut frame, 0.0, &EffectConfig::default())
            .unwrap();
        assert_eq!(frame.get_pixel(0, 0), [255, 245, 0]);
    }
}
