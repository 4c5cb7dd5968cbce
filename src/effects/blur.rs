use crate::{
    effects::traits::{Effect, EffectConfig, EffectMetadata},
    effects::BLUR_SIGMA,
    error::{EffectError, Result},
    video::types::Frame,
};

const DEFAULT_BLUR_SIGMA: f32 = 2.0;

/// Gaussian blur over the whole slide
pub struct BlurEffect;

impl BlurEffect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BlurEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for BlurEffect {
    fn name(&self) -> &str {
        "blur"
    }

    fn label(&self) -> &str {
        "Blur"
    }

    fn description(&self) -> &str {
        "Soft gaussian blur"
    }

    fn apply_effect(&self, frame: &mut Frame, _progress: f32, config: &EffectConfig) -> Result<()> {
        let sigma = config.get_f32_or(BLUR_SIGMA, DEFAULT_BLUR_SIGMA) * config.intensity;
        if sigma <= 0.0 {
            return Ok(());
        }

        let blurred = image::imageops::blur(frame.as_image(), sigma);
        *frame = Frame::new(blurred);
        Ok(())
    }

    fn validate_config(&self, config: &EffectConfig) -> Result<()> {
        let sigma = config.get_f32_or(BLUR_SIGMA, DEFAULT_BLUR_SIGMA);
        if !sigma.is_finite() || sigma < 0.0 {
            return Err(EffectError::InvalidConfig {
                details: format!("{} must be a non-negative number, got {}", BLUR_SIGMA, sigma),
            }
            .into());
        }
        Ok(())
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            performance_impact: 0.4,
            optional_parameters: vec![(
                BLUR_SIGMA.to_string(),
                "Gaussian standard deviation in pixels (default 2.0)".to_string(),
            )],
        }
    }
}
