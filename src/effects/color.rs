use rayon::prelude::*;

use crate::{
    effects::traits::{Effect, EffectConfig, EffectMetadata},
    effects::SEPIA_STRENGTH,
    error::Result,
    video::types::Frame,
};

fn luma(r: f32, g: f32, b: f32) -> f32 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Apply `map` to every pixel, blending the result with the original by `amount`
fn map_pixels<F>(frame: &mut Frame, amount: f32, map: F)
where
    F: Fn(f32, f32, f32) -> [f32; 3] + Sync,
{
    let amount = amount.clamp(0.0, 1.0);
    if amount <= 0.0 {
        return;
    }

    let buffer: &mut [u8] = frame.as_image_mut();
    buffer.par_chunks_exact_mut(3).for_each(|pixel| {
        let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
        let mapped = map(r, g, b);
        for (channel, target) in pixel.iter_mut().zip(mapped) {
            let original = *channel as f32;
            *channel = (original + (target - original) * amount).round().clamp(0.0, 255.0) as u8;
        }
    });
}

/// Warm brown tint of an old photograph
pub struct SepiaEffect;

impl SepiaEffect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SepiaEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for SepiaEffect {
    fn name(&self) -> &str {
        "sepia"
    }

    fn label(&self) -> &str {
        "Sepia"
    }

    fn description(&self) -> &str {
        "Warm brown tones of an aged photograph"
    }

    fn apply_effect(&self, frame: &mut Frame, _progress: f32, config: &EffectConfig) -> Result<()> {
        let strength = config.get_f32_or(SEPIA_STRENGTH, 1.0) * config.intensity;
        map_pixels(frame, strength, |r, g, b| {
            [
                0.393 * r + 0.769 * g + 0.189 * b,
                0.349 * r + 0.686 * g + 0.168 * b,
                0.272 * r + 0.534 * g + 0.131 * b,
            ]
        });
        Ok(())
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            performance_impact: 0.1,
            optional_parameters: vec![(
                SEPIA_STRENGTH.to_string(),
                "Blend between the original colors and full sepia (0.0-1.0)".to_string(),
            )],
        }
    }
}

/// Black and white
pub struct GrayscaleEffect;

impl GrayscaleEffect {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GrayscaleEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl Effect for GrayscaleEffect {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn label(&self) -> &str {
        "Grayscale"
    }

    fn description(&self) -> &str {
        "Removes all color, leaving luminance only"
    }

    fn apply_effect(&self, frame: &mut Frame, _progress: f32, config: &EffectConfig) -> Result<()> {
        map_pixels(frame, config.intensity, |r, g, b| {
            let y = luma(r, g, b);
            [y, y, y]
        });
        Ok(())
    }

    fn metadata(&self) -> EffectMetadata {
        EffectMetadata {
            performance_impact: 0.1,
            optional_parameters: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grayscale_equalizes_channels() {
        let mut frame = Frame::new_filled(3, 3, [200, 50, 10]);
        GrayscaleEffect::new()
            .apply_effect(&mut frame, 0.0, &EffectConfig::default())
            .unwrap();

        let [r, g, b] = frame.get_pixel(1, 1);
        assert_eq!(r, g);
        assert_eq!(g, b);
        assert_eq!(r, 90); // 0.299*200 + 0.587*50 + 0.114*10 = 90.29
    }

    #[test]
    fn test_sepia_warms_gray() {
        let mut frame = Frame::new_filled(2, 2, [128, 128, 128]);
        SepiaEffect::new()
            .apply_effect(&mut frame, 0.0, &EffectConfig::default())
            .unwrap();

        let [r, g, b] = frame.get_pixel(0, 0);
        assert!(r > g && g > b, "sepia should order channels red > green > blue");
    }

    #[test]
    fn test_zero_intensity_keeps_colors() {
        let mut frame = Frame::new_filled(2, 2, [10, 200, 30]);
        SepiaEffect::new()
            .apply_effect(&mut frame, 0.0, &EffectConfig::with_intensity(0.0))
            .unwrap();
        assert_eq!(frame.get_pixel(0, 0), [10, 200, 30]);
    }
}
