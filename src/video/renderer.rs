use std::borrow::Cow;
use std::ops::Range;

use rayon::prelude::*;
use tracing::debug;

use crate::{
    effects::{normalize_name, Effect, EffectConfig, EffectRegistry, NO_EFFECT},
    error::{CompositionError, EffectError, Result},
    overlay::PreparedOverlay,
    slides::ImageItem,
    video::{timeline::Timeline, types::Frame},
};

/// A fitted slide with its effect and overlay ready to draw.
///
/// Static effects and overlays are baked into `base` once. Animated effects
/// are re-applied to a copy of `base` for every frame, followed by the overlay.
pub struct PreparedSlide {
    base: Frame,
    effect: Option<Box<dyn Effect>>,
    overlay: PreparedOverlay,
}

impl PreparedSlide {
    pub fn new(
        fitted: Frame,
        item: &ImageItem,
        effects: &EffectRegistry,
        effect_config: &EffectConfig,
    ) -> Result<Self> {
        let frame_size = (fitted.width(), fitted.height());
        let overlay = item.overlay.prepare(frame_size)?;
        let mut base = fitted;

        let name = normalize_name(&item.effect);
        let effect = if name.is_empty() || name == NO_EFFECT {
            None
        } else {
            let effect = effects
                .get_effect(&name)
                .ok_or_else(|| EffectError::NotFound { name: item.effect.clone() })?;
            effect.validate_config(effect_config)?;
            Some(effect)
        };

        let effect = match effect {
            Some(effect) if effect.is_animated() => Some(effect),
            Some(effect) => {
                effect.apply_effect(&mut base, 0.0, effect_config)?;
                overlay.apply(&mut base);
                None
            }
            None => {
                overlay.apply(&mut base);
                None
            }
        };

        let overlay = if effect.is_some() { overlay } else { PreparedOverlay::None };
        debug!(
            "Prepared slide {} (effect: {}, animated: {})",
            item.file_name(),
            item.effect,
            effect.is_some()
        );

        Ok(Self { base, effect, overlay })
    }

    /// The slide as it looks `progress` of the way through its time on screen
    pub fn frame_at(&self, progress: f32, effect_config: &EffectConfig) -> Result<Cow<'_, Frame>> {
        match &self.effect {
            None => Ok(Cow::Borrowed(&self.base)),
            Some(effect) => {
                let mut frame = self.base.clone();
                effect.apply_effect(&mut frame, progress.clamp(0.0, 1.0), effect_config)?;
                self.overlay.apply(&mut frame);
                Ok(Cow::Owned(frame))
            }
        }
    }
}

/// Draws output frames from prepared slides laid out on a timeline
pub struct FrameRenderer {
    /// One entry per timeline span, `None` for slides that were never loaded
    slides: Vec<Option<PreparedSlide>>,
    timeline: Timeline,
    frame_size: (u32, u32),
    background: [u8; 3],
    effect_config: EffectConfig,
}

impl FrameRenderer {
    pub fn new(
        slides: Vec<PreparedSlide>,
        timeline: Timeline,
        frame_size: (u32, u32),
        background: [u8; 3],
        effect_config: EffectConfig,
    ) -> Result<Self> {
        let slides = slides.into_iter().map(Some).collect();
        Self::partial(slides, timeline, frame_size, background, effect_config)
    }

    /// Renderer that only has some slides prepared, rendering fails at times
    /// where a missing slide is on screen
    pub fn partial(
        slides: Vec<Option<PreparedSlide>>,
        timeline: Timeline,
        frame_size: (u32, u32),
        background: [u8; 3],
        effect_config: EffectConfig,
    ) -> Result<Self> {
        if slides.len() != timeline.spans().len() {
            return Err(CompositionError::TimelineFailed {
                reason: format!(
                    "{} prepared slides for {} timeline entries",
                    slides.len(),
                    timeline.spans().len()
                ),
            }
            .into());
        }

        Ok(Self {
            slides,
            timeline,
            frame_size,
            background,
            effect_config,
        })
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn frame_size(&self) -> (u32, u32) {
        self.frame_size
    }

    pub fn frame_count(&self) -> usize {
        self.timeline.frame_count()
    }

    /// Render the frame shown at `time` seconds
    pub fn render_at(&self, time: f64) -> Result<Frame> {
        let (width, height) = self.frame_size;
        let mut canvas = Frame::new_filled(width, height, self.background);

        for span in self.timeline.active_at(time) {
            let local = span.local_time(time);
            let state = span.transitions.state_at(local, span.duration, self.frame_size);
            if state.opacity <= 0.0 {
                continue;
            }

            let slide = self.slides[span.index]
                .as_ref()
                .ok_or_else(|| CompositionError::TimelineFailed {
                    reason: format!("slide {} is on screen at {:.2}s but was not prepared", span.index + 1, time),
                })?;
            let layer = slide.frame_at(span.progress(time), &self.effect_config)?;
            canvas.composite(&layer, state.offset, state.opacity);
        }

        Ok(canvas)
    }

    /// Render frame number `index`
    pub fn render_frame(&self, index: usize) -> Result<Frame> {
        self.render_at(self.timeline.frame_time(index))
    }

    /// Render a range of frames in parallel, returned in order
    pub fn render_batch(&self, range: Range<usize>) -> Result<Vec<Frame>> {
        range
            .into_par_iter()
            .map(|index| self.render_frame(index))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slides::SlideList;
    use crate::transitions::{Side, TransitionKind};

    const SIZE: (u32, u32) = (8, 4);

    fn renderer(items: Vec<(ImageItem, [u8; 3])>, overlap: f64, fps: u32) -> FrameRenderer {
        let effects = EffectRegistry::new();
        let config = EffectConfig::default();

        let slides: Vec<PreparedSlide> = items
            .iter()
            .map(|(item, color)| {
                PreparedSlide::new(Frame::new_filled(SIZE.0, SIZE.1, *color), item, &effects, &config).unwrap()
            })
            .collect();
        let list: SlideList = items.into_iter().map(|(item, _)| item).collect();
        let timeline = Timeline::build(&list, overlap, fps).unwrap();

        FrameRenderer::new(slides, timeline, SIZE, [0, 0, 0], config).unwrap()
    }

    fn item(start: TransitionKind, end: TransitionKind) -> ImageItem {
        let mut item = ImageItem::new("slide.png");
        item.duration = 2.0;
        item.start_transition = start;
        item.end_transition = end;
        item
    }

    #[test]
    fn test_fade_in_from_background() {
        let r = renderer(vec![(item(TransitionKind::Fade, TransitionKind::None), [200, 200, 200])], 0.0, 10);

        assert_eq!(r.render_at(0.0).unwrap().get_pixel(0, 0), [0, 0, 0]);
        assert_eq!(r.render_at(1.5).unwrap().get_pixel(0, 0), [200, 200, 200]);

        let mid = r.render_at(0.5).unwrap().get_pixel(0, 0)[0];
        assert!(mid > 90 && mid < 110, "half-faded value was {}", mid);
    }

    #[test]
    fn test_crossfade_draws_later_slide_on_top() {
        let r = renderer(
            vec![
                (item(TransitionKind::None, TransitionKind::None), [255, 0, 0]),
                (item(TransitionKind::Fade, TransitionKind::None), [0, 0, 255]),
            ],
            1.0,
            10,
        );

        // Second slide starts at 1.0 and is fully opaque from 2.0
        assert_eq!(r.timeline().spans()[1].start, 1.0);
        assert_eq!(r.render_at(0.5).unwrap().get_pixel(0, 0), [255, 0, 0]);
        let blend = r.render_at(1.5).unwrap().get_pixel(0, 0);
        assert!(blend[0] > 0 && blend[2] > 0);
        assert_eq!(r.render_at(2.5).unwrap().get_pixel(0, 0), [0, 0, 255]);
    }

    #[test]
    fn test_slide_in_from_right() {
        let r = renderer(
            vec![(item(TransitionKind::Slide(Side::Right), TransitionKind::None), [0, 255, 0])],
            0.0,
            10,
        );

        // Halfway through the transition the left half is still background
        let frame = r.render_at(0.5).unwrap();
        assert_eq!(frame.get_pixel(1, 1), [0, 0, 0]);
        assert_eq!(frame.get_pixel(6, 1), [0, 255, 0]);
    }

    #[test]
    fn test_batch_matches_single_frames() {
        let mut zoom = item(TransitionKind::Fade, TransitionKind::Fade);
        zoom.effect = "Zoom In".to_string();
        let r = renderer(vec![(zoom, [120, 60, 30])], 0.0, 10);

        assert_eq!(r.frame_count(), 20);
        let batch = r.render_batch(5..9).unwrap();
        assert_eq!(batch.len(), 4);
        assert_eq!(batch[2].as_bytes(), r.render_frame(7).unwrap().as_bytes());
    }

    #[test]
    fn test_partial_renderer_needs_only_visible_slides() {
        let effects = EffectRegistry::new();
        let config = EffectConfig::default();
        let first = item(TransitionKind::None, TransitionKind::None);
        let second = item(TransitionKind::None, TransitionKind::None);

        let prepared = PreparedSlide::new(Frame::new_filled(SIZE.0, SIZE.1, [9, 9, 9]), &first, &effects, &config).unwrap();
        let list: SlideList = vec![first, second].into_iter().collect();
        let timeline = Timeline::build(&list, 0.0, 10).unwrap();

        let r = FrameRenderer::partial(vec![Some(prepared), None], timeline, SIZE, [0, 0, 0], config).unwrap();
        assert_eq!(r.render_at(1.0).unwrap().get_pixel(0, 0), [9, 9, 9]);
        assert!(r.render_at(3.0).is_err());
    }

    #[test]
    fn test_unknown_effect_fails() {
        let mut bad = ImageItem::new("a.png");
        bad.effect = "swirl".to_string();
        let result = PreparedSlide::new(
            Frame::new_black(4, 4),
            &bad,
            &EffectRegistry::new(),
            &EffectConfig::default(),
        );
        assert!(result.is_err());
    }
}
