//! # Transitions
//!
//! Start and end transitions for a slide. A transition is edge-agnostic:
//! `Fade` fades in at the start of a slide and out at its end, `Slide(Left)`
//! enters from the left edge and leaves toward it.
//!
//! Names are parsed leniently so both the short form (`fade`, `slide_left`)
//! and the long form (`Fade In`, `Slide Out Left`, `slide-in-left`) work.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EffectError;

/// Screen edge a slide transition moves toward or comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Unit vector pointing from the frame toward this edge
    fn direction(&self) -> (i32, i32) {
        match self {
            Side::Left => (-1, 0),
            Side::Right => (1, 0),
            Side::Top => (0, -1),
            Side::Bottom => (0, 1),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        }
    }
}

/// Kind of transition applied at one edge of a slide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TransitionKind {
    #[default]
    None,
    Fade,
    Slide(Side),
}

impl TransitionKind {
    /// Every transition kind, `None` included
    pub fn all() -> Vec<TransitionKind> {
        let mut kinds = vec![TransitionKind::None, TransitionKind::Fade];
        kinds.extend(Side::ALL.into_iter().map(TransitionKind::Slide));
        kinds
    }

    /// Every transition that actually does something
    pub fn visible() -> Vec<TransitionKind> {
        Self::all().into_iter().filter(|kind| !kind.is_none()).collect()
    }

    pub fn is_none(&self) -> bool {
        matches!(self, TransitionKind::None)
    }

    /// Human-readable label for the given edge, e.g. "Slide In Left"
    pub fn label(&self, edge: Edge) -> String {
        let verb = match edge {
            Edge::Start => "In",
            Edge::End => "Out",
        };
        match self {
            TransitionKind::None => "None".to_string(),
            TransitionKind::Fade => format!("Fade {}", verb),
            TransitionKind::Slide(side) => {
                let side = side.name();
                let mut chars = side.chars();
                let capitalized = match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                };
                format!("Slide {} {}", verb, capitalized)
            }
        }
    }
}

impl fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionKind::None => f.write_str("none"),
            TransitionKind::Fade => f.write_str("fade"),
            TransitionKind::Slide(side) => write!(f, "slide_{}", side.name()),
        }
    }
}

impl FromStr for TransitionKind {
    type Err = EffectError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| c == ' ' || c == '_' || c == '-')
            .filter(|token| !token.is_empty() && *token != "in" && *token != "out")
            .collect();

        let kind = match tokens.as_slice() {
            [] | ["none"] => Some(TransitionKind::None),
            ["fade"] => Some(TransitionKind::Fade),
            ["slide", side] => Side::ALL
                .into_iter()
                .find(|candidate| candidate.name() == *side)
                .map(TransitionKind::Slide),
            _ => None,
        };

        kind.ok_or_else(|| EffectError::UnknownTransition { name: s.to_string() })
    }
}

impl TryFrom<String> for TransitionKind {
    type Error = EffectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TransitionKind> for String {
    fn from(kind: TransitionKind) -> Self {
        kind.to_string()
    }
}

/// Which end of a slide a transition belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Start,
    End,
}

/// Opacity and displacement of a slide layer at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransitionState {
    pub opacity: f32,
    pub offset: (i32, i32),
}

impl TransitionState {
    pub const VISIBLE: TransitionState = TransitionState {
        opacity: 1.0,
        offset: (0, 0),
    };

    /// Appearance of `kind` when the slide is `visibility` of the way on screen
    /// (0.0 = absent, 1.0 = fully present).
    pub fn for_kind(kind: TransitionKind, visibility: f64, frame_size: (u32, u32)) -> Self {
        let visibility = visibility.clamp(0.0, 1.0);
        match kind {
            TransitionKind::None => Self::VISIBLE,
            TransitionKind::Fade => TransitionState {
                opacity: visibility as f32,
                offset: (0, 0),
            },
            TransitionKind::Slide(side) => {
                let (dx, dy) = side.direction();
                let hidden = 1.0 - visibility;
                TransitionState {
                    opacity: 1.0,
                    offset: (
                        (dx as f64 * frame_size.0 as f64 * hidden).round() as i32,
                        (dy as f64 * frame_size.1 as f64 * hidden).round() as i32,
                    ),
                }
            }
        }
    }

    /// Stack two states: opacities multiply, offsets add
    pub fn combine(self, other: TransitionState) -> Self {
        TransitionState {
            opacity: self.opacity * other.opacity,
            offset: (self.offset.0 + other.offset.0, self.offset.1 + other.offset.1),
        }
    }
}

/// The resolved start and end transitions of one slide
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideTransitions {
    pub start: TransitionKind,
    pub start_duration: f64,
    pub end: TransitionKind,
    pub end_duration: f64,
}

impl SlideTransitions {
    /// Resolve the effective transition durations for a slide.
    ///
    /// `None` transitions take no time, and when the two transitions together
    /// are longer than the slide both are shortened proportionally.
    pub fn resolve(
        start: TransitionKind,
        start_duration: f64,
        end: TransitionKind,
        end_duration: f64,
        slide_duration: f64,
    ) -> Self {
        let mut start_duration = if start.is_none() { 0.0 } else { start_duration.max(0.0) };
        let mut end_duration = if end.is_none() { 0.0 } else { end_duration.max(0.0) };

        let total = start_duration + end_duration;
        if total > slide_duration && total > 0.0 {
            let scale = slide_duration.max(0.0) / total;
            start_duration *= scale;
            end_duration *= scale;
        }

        Self {
            start,
            start_duration,
            end,
            end_duration,
        }
    }

    /// Layer state `local_time` seconds into a slide lasting `slide_duration`
    pub fn state_at(&self, local_time: f64, slide_duration: f64, frame_size: (u32, u32)) -> TransitionState {
        let entering = if self.start_duration > 0.0 && local_time < self.start_duration {
            local_time / self.start_duration
        } else {
            1.0
        };

        let remaining = slide_duration - local_time;
        let leaving = if self.end_duration > 0.0 && remaining < self.end_duration {
            remaining / self.end_duration
        } else {
            1.0
        };

        TransitionState::for_kind(self.start, entering, frame_size)
            .combine(TransitionState::for_kind(self.end, leaving, frame_size))
    }
}
