use crate::{
    effects::sampling::resample_window,
    effects::traits::{Effect, EffectConfig, EffectMetadata},
    effects::PAN_SCALE,
    error::{EffectError, Result},
    video::types::Frame,
};

const DEFAULT_PAN_SCALE: f32 = 1.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    LeftToRight,
    RightToLeft,
    TopToBottom,
    BottomToTop,
}

/// Camera pan across a slightly magnified slide
///
/// The view is a window of `1 / pan_scale` of the frame that travels from one
/// edge of the image to the opposite edge over the slide's duration.
pub struct PanEffect {
    direction: PanDirection,
}

impl PanEffect {
    pub fn new(direction: PanDirection) -> Self {
        Self { direction }
    }

    /// Window origin as a fraction of the available travel on each axis
    fn travel_at(&self, progress: f32) -> (f64, f64) {
        let p = progress.clamp(0.0, 1.0) as f64;
        match self.direction {
            PanDirection::LeftToRight => (p, 0.5),
            PanDirection::RightToLeft => (1.0 - p, 0.5),
            PanDirection::TopToBottom => (0.5, p),
            PanDirection::BottomToTop => (0.5, 1.0 - p),
        }
    }
}

impl Effect for PanEffect {
    fn name(&self) -> &str {
        match self.direction {
            PanDirection::LeftToRight => "pan_left_to_right",
            PanDirection::RightToLeft => "pan_right_to_left",
            PanDirection::TopToBottom => "pan_top_to_bottom",
            PanDirection::BottomToTop => "pan_bottom_to_top",
        }
    }

    fn label(&self) -> &str {
        match self.direction {
            PanDirection::LeftToRight => "Pan Left to Right",
            PanDirection::RightToLeft => "Pan Right to Left",
            PanDirection::TopToBottom => "Pan Top to Bottom",
            PanDirection::BottomToTop => "Pan Bottom to Top",
        }
    }

    fn description(&self) -> &str {
        "Moves the view across the image like a slow camera pan"
    }

    fn apply_effect(&self, frame: &mut Frame, progress: f32, config: &EffectConfig) -> Result<()> {
        let pan_scale = config.get_f32_or(PAN_SCALE, DEFAULT_PAN_SCALE).max(1.0);
        let scale = 1.0 + (pan_scale as f64 - 1.0) * config.intensity.clamp(0.0, 1.0) as f64;
        if scale <= 1.0 + 1e-6 {
            return Ok(());
        }

        let (width, height) = (frame.width() as f64, frame.height() as f64);
        let window = (width / scale, height / scale);
        let (tx, ty) = self.travel_at(progress);
        let origin = ((width - window.0) * tx, (height - window.1) * ty);

        *frame = resample_window(frame, origin, window, (frame.width(), frame.height()))?;
        Ok(())
    }

    fn is_animated(&self) -> bool {
        true
    }

    fn validate_config(&self, config: &EffectConfig) -> Result<()> {
        let pan_scale = config.get_f32_or(PAN_SCALE, DEFAULT_PAN_SCALE);
        if !(1.0..=3.0).contains(&pan_scale) {
            return Err(EffectError::InvalidConfig {
                details: format!("{} must be between 1.0 and 3.0, got {}", PAN_SCALE, pan_scale),
            }
            .into());
        }
        Ok(())
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            performance_impact: 0.6,
            optional_parameters: vec![(
                PAN_SCALE.to_string(),
                "Magnification that gives the pan room to travel (default 1.25)".to_string(),
            )],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Left half red, right half blue
    fn split_frame() -> Frame {
        let mut frame = Frame::new_black(40, 20);
        for y in 0..20 {
            for x in 0..40 {
                let color = if x < 20 { [255, 0, 0] } else { [0, 0, 255] };
                frame.set_pixel(x, y, color);
            }
        }
        frame
    }

    #[test]
    fn test_pan_left_to_right_starts_left() {
        let effect = PanEffect::new(PanDirection::LeftToRight);
        let config = EffectConfig::default().set(PAN_SCALE, 2.0);

        let mut start = split_frame();
        effect.apply_effect(&mut start, 0.0, &config).unwrap();
        assert_eq!(start.get_pixel(20, 10), [255, 0, 0]);

        let mut end = split_frame();
        effect.apply_effect(&mut end, 1.0, &config).unwrap();
        assert_eq!(end.get_pixel(20, 10), [0, 0, 255]);
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        let effect = PanEffect::new(PanDirection::BottomToTop);
        let mut frame = split_frame();
        effect
            .apply_effect(&mut frame, 0.5, &EffectConfig::with_intensity(0.0))
            .unwrap();
        assert_eq!(frame.get_pixel(0, 0), [255, 0, 0]);
        assert_eq!(frame.get_pixel(39, 0), [0, 0, 255]);
    }
}
