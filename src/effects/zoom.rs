use crate::{
    effects::sampling::resample_window,
    effects::traits::{Effect, EffectConfig, EffectMetadata},
    effects::ZOOM_AMOUNT,
    error::{EffectError, Result},
    video::types::Frame,
};

const DEFAULT_ZOOM_AMOUNT: f32 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Slow zoom toward (or away from) the center of the slide
pub struct ZoomEffect {
    direction: ZoomDirection,
}

impl ZoomEffect {
    pub fn new(direction: ZoomDirection) -> Self {
        Self { direction }
    }

    /// Magnification at the given progress
    fn scale_at(&self, progress: f32, amount: f32) -> f64 {
        let progress = progress.clamp(0.0, 1.0) as f64;
        let amount = amount.max(0.0) as f64;
        match self.direction {
            ZoomDirection::In => 1.0 + amount * progress,
            ZoomDirection::Out => 1.0 + amount * (1.0 - progress),
        }
    }
}

impl Effect for ZoomEffect {
    fn name(&self) -> &str {
        match self.direction {
            ZoomDirection::In => "zoom_in",
            ZoomDirection::Out => "zoom_out",
        }
    }

    fn label(&self) -> &str {
        match self.direction {
            ZoomDirection::In => "Zoom In",
            ZoomDirection::Out => "Zoom Out",
        }
    }

    fn description(&self) -> &str {
        match self.direction {
            ZoomDirection::In => "Gradually magnifies the center of the image",
            ZoomDirection::Out => "Starts magnified and pulls back to the full image",
        }
    }

    fn apply_effect(&self, frame: &mut Frame, progress: f32, config: &EffectConfig) -> Result<()> {
        let amount = config.get_f32_or(ZOOM_AMOUNT, DEFAULT_ZOOM_AMOUNT) * config.intensity;
        let scale = self.scale_at(progress, amount);
        if scale <= 1.0 + 1e-6 {
            return Ok(());
        }

        let (width, height) = (frame.width() as f64, frame.height() as f64);
        let window = (width / scale, height / scale);
        let origin = ((width - window.0) / 2.0, (height - window.1) / 2.0);

        *frame = resample_window(frame, origin, window, (frame.width(), frame.height()))?;
        Ok(())
    }

    fn is_animated(&self) -> bool {
        true
    }

    fn validate_config(&self, config: &EffectConfig) -> Result<()> {
        let amount = config.get_f32_or(ZOOM_AMOUNT, DEFAULT_ZOOM_AMOUNT);
        if !(0.0..=2.0).contains(&amount) {
            return Err(EffectError::InvalidConfig {
                details: format!("{} must be between 0.0 and 2.0, got {}", ZOOM_AMOUNT, amount),
            }
            .into());
        }
        Ok(())
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            performance_impact: 0.6,
            optional_parameters: vec![(
                ZOOM_AMOUNT.to_string(),
                "Extra magnification reached at the end of the zoom (default 0.2)".to_string(),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_scales() {
        let zoom_in = ZoomEffect::new(ZoomDirection::In);
        assert_eq!(zoom_in.scale_at(0.0, 0.2), 1.0);
        assert!((zoom_in.scale_at(1.0, 0.2) - 1.2).abs() < 1e-6);

        let zoom_out = ZoomEffect::new(ZoomDirection::Out);
        assert!((zoom_out.scale_at(0.0, 0.2) - 1.2).abs() < 1e-6);
        assert_eq!(zoom_out.scale_at(1.0, 0.2), 1.0);
    }

    #[test]
    fn test_zoom_in_magnifies_center() {
        // Bright center on a dark frame: zooming in spreads the center outward
        let mut frame = Frame::new_black(40, 40);
        for y in 10..30 {
            for x in 10..30 {
                frame.set_pixel(x, y, [255, 255, 255]);
            }
        }

        let effect = ZoomEffect::new(ZoomDirection::In);
        let config = EffectConfig::default().set(ZOOM_AMOUNT, 1.0);
        effect.apply_effect(&mut frame, 1.0, &config).unwrap();

        assert_eq!(frame.width(), 40);
        assert_eq!(frame.get_pixel(5, 20), [255, 255, 255]);
    }

    #[test]
    fn test_invalid_zoom_amount() {
        let effect = ZoomEffect::new(ZoomDirection::Out);
        let config = EffectConfig::default().set(ZOOM_AMOUNT, 5.0);
        assert!(effect.validate_config(&config).is_err());
    }
}
