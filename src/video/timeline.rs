use tracing::debug;

use crate::{
    error::{CompositionError, Result},
    slides::SlideList,
    transitions::SlideTransitions,
};

/// Placement of one slide on the output timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideSpan {
    /// Position of the slide in the list
    pub index: usize,
    pub start: f64,
    pub duration: f64,
    pub transitions: SlideTransitions,
}

impl SlideSpan {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end()
    }

    /// Seconds since the slide appeared
    pub fn local_time(&self, time: f64) -> f64 {
        (time - self.start).clamp(0.0, self.duration)
    }

    /// Position within the slide from 0.0 to 1.0
    pub fn progress(&self, time: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        (self.local_time(time) / self.duration) as f32
    }
}

/// When each slide is on screen
#[derive(Debug, Clone)]
pub struct Timeline {
    spans: Vec<SlideSpan>,
    total_duration: f64,
    fps: u32,
}

impl Timeline {
    /// Lay the slides out back to back.
    ///
    /// Each slide starts before its predecessor ends by `overlap` times its own
    /// start transition, so the incoming transition plays over the outgoing
    /// slide. The overlap never exceeds either slide's duration.
    pub fn build(slides: &SlideList, overlap: f64, fps: u32) -> Result<Self> {
        if slides.is_empty() {
            return Err(CompositionError::NoImages.into());
        }
        if fps == 0 {
            return Err(CompositionError::TimelineFailed {
                reason: "frame rate must be positive".to_string(),
            }
            .into());
        }

        let overlap = overlap.clamp(0.0, 1.0);
        let mut spans: Vec<SlideSpan> = Vec::with_capacity(slides.len());

        for (index, item) in slides.iter().enumerate() {
            let duration = item.duration.max(0.0);
            let transitions = item.transitions();

            let start = match spans.last() {
                None => 0.0,
                Some(previous) => {
                    let shared = (overlap * transitions.start_duration)
                        .min(previous.duration)
                        .min(duration);
                    previous.end() - shared
                }
            };

            spans.push(SlideSpan {
                index,
                start,
                duration,
                transitions,
            });
        }

        let total_duration = spans.last().map(|span| span.end()).unwrap_or(0.0);
        debug!(
            "Timeline: {} slides, {:.2}s at {} fps",
            spans.len(),
            total_duration,
            fps
        );

        Ok(Self {
            spans,
            total_duration,
            fps,
        })
    }

    pub fn spans(&self) -> &[SlideSpan] {
        &self.spans
    }

    pub fn total_duration(&self) -> f64 {
        self.total_duration
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// Number of frames in the output, never less than one
    pub fn frame_count(&self) -> usize {
        ((self.total_duration * self.fps as f64).round() as usize).max(1)
    }

    /// Timestamp of frame `index`
    pub fn frame_time(&self, index: usize) -> f64 {
        index as f64 / self.fps as f64
    }

    /// Slides on screen at `time`, in list order
    pub fn active_at(&self, time: f64) -> impl Iterator<Item = &SlideSpan> {
        self.spans.iter().filter(move |span| span.contains(time))
    }
}

/// Format seconds as `MM:SS`
pub fn format_time(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
