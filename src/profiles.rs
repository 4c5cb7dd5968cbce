//! # Profiles and Selection Modes
//!
//! A profile is a named bundle of transition and effect choices. The
//! selection mode decides where each slide's settings come from: the slide
//! itself, a random draw, or a profile applied to every slide.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info};

use crate::{
    effects::{normalize_name, EffectRegistry, NO_EFFECT},
    error::{EffectError, Result},
    overlay::Overlay,
    slides::SlideList,
    transitions::{Side, TransitionKind},
};

/// Named preset bundle of transition/effect choices
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub description: String,
    pub start_transition: TransitionKind,
    pub end_transition: TransitionKind,
    pub effect: String,

    /// Replaces each slide's overlay when set
    pub overlay: Option<Overlay>,
}

impl Profile {
    pub fn new(
        name: &str,
        description: &str,
        start_transition: TransitionKind,
        end_transition: TransitionKind,
        effect: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            start_transition,
            end_transition,
            effect: effect.to_string(),
            overlay: None,
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    /// Apply the profile to every slide, keeping durations
    pub fn apply(&self, slides: &mut SlideList) {
        for item in slides.iter_mut() {
            item.start_transition = self.start_transition;
            item.end_transition = self.end_transition;
            item.effect = self.effect.clone();
            if let Some(overlay) = &self.overlay {
                item.overlay = overlay.clone();
            }
        }
    }
}

/// Registry of named profiles
pub struct ProfileRegistry {
    profiles: BTreeMap<String, Profile>,
}

impl ProfileRegistry {
    /// Create a registry with all built-in profiles
    pub fn new() -> Self {
        let mut registry = Self {
            profiles: BTreeMap::new(),
        };
        registry.register_builtin_profiles();
        registry
    }

    fn register_builtin_profiles(&mut self) {
        let fade = TransitionKind::Fade;

        self.register(Profile::new("classic", "Fade in and out, no effect", fade, fade, NO_EFFECT));
        self.register(Profile::new(
            "ken-burns",
            "Fades with a slow zoom into every photo",
            fade,
            fade,
            "zoom_in",
        ));
        self.register(Profile::new(
            "documentary",
            "Fades with a gentle left-to-right pan",
            fade,
            fade,
            "pan_left_to_right",
        ));
        self.register(Profile::new("vintage", "Sepia-toned photos with fades", fade, fade, "sepia"));
        self.register(Profile::new("monochrome", "Black and white with fades", fade, fade, "grayscale"));
        self.register(Profile::new(
            "dynamic",
            "Carousel: each photo slides in from the right and out to the left",
            TransitionKind::Slide(Side::Right),
            TransitionKind::Slide(Side::Left),
            NO_EFFECT,
        ));
        self.register(Profile::new(
            "dreamy",
            "Soft fades while pulling back from each photo",
            fade,
            fade,
            "zoom_out",
        ));
    }

    /// Register (or replace) a profile
    pub fn register(&mut self, profile: Profile) {
        self.profiles.insert(normalize_name(&profile.name), profile);
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(&normalize_name(name))
    }

    /// Profile names in sorted order
    pub fn names(&self) -> Vec<String> {
        self.profiles.values().map(|profile| profile.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Profile> {
        self.profiles.values()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Apply the named profile to every slide
    pub fn apply(&self, name: &str, slides: &mut SlideList) -> Result<()> {
        let profile = self
            .get(name)
            .ok_or_else(|| EffectError::ProfileNotFound { name: name.to_string() })?;
        profile.apply(slides);
        Ok(())
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Where slide transitions and effects come from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every slide keeps its own settings
    #[default]
    Manual,

    /// Each slide gets a random start transition, end transition and effect
    Random {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        seed: Option<u64>,
    },

    /// Every slide takes the named profile's settings
    Profile { name: String },
}

impl SelectionMode {
    /// Rewrite the slides' transitions and effects according to the mode
    pub fn apply(
        &self,
        slides: &mut SlideList,
        profiles: &ProfileRegistry,
        effects: &EffectRegistry,
    ) -> Result<()> {
        match self {
            SelectionMode::Manual => {
                debug!("Manual mode: keeping per-slide settings");
                Ok(())
            }
            SelectionMode::Random { seed } => {
                let mut rng = match seed {
                    Some(seed) => StdRng::seed_from_u64(*seed),
                    None => StdRng::from_entropy(),
                };

                let transitions = TransitionKind::visible();
                let mut effect_names = effects.available_effects();
                effect_names.push(NO_EFFECT.to_string());

                for item in slides.iter_mut() {
                    if let Some(kind) = transitions.choose(&mut rng) {
                        item.start_transition = *kind;
                    }
                    if let Some(kind) = transitions.choose(&mut rng) {
                        item.end_transition = *kind;
                    }
                    if let Some(effect) = effect_names.choose(&mut rng) {
                        item.effect = effect.clone();
                    }
                    debug!(
                        "Random pick for {}: {} / {} / {}",
                        item.file_name(),
                        item.start_transition,
                        item.end_transition,
                        item.effect
                    );
                }

                info!("Random mode assigned settings to {} slides", slides.len());
                Ok(())
            }
            SelectionMode::Profile { name } => {
                profiles.apply(name, slides)?;
                info!("Applied profile '{}' to {} slides", name, slides.len());
                Ok(())
            }
        }
    }
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Manual => f.write_str("manual"),
            SelectionMode::Random { seed: Some(seed) } => write!(f, "random (seed {})", seed),
            SelectionMode::Random { seed: None } => f.write_str("random"),
            SelectionMode::Profile { name } => write!(f, "profile '{}'", name),
        }
    }
}
