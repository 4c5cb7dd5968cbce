//! # Overlays
//!
//! Content drawn on top of a slide after its effect: an image watermark or a
//! solid frame border. Overlays move and fade together with the slide.

use image::{imageops::FilterType, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ImageError, Result};
use crate::video::types::Frame;

/// Corner (or center) a watermark is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl Anchor {
    /// Top-left position of an `item` sized box inside `frame` with `margin`
    fn position(&self, frame: (u32, u32), item: (u32, u32), margin: u32) -> (i64, i64) {
        let (fw, fh) = (frame.0 as i64, frame.1 as i64);
        let (iw, ih) = (item.0 as i64, item.1 as i64);
        let m = margin as i64;
        match self {
            Anchor::TopLeft => (m, m),
            Anchor::TopRight => (fw - iw - m, m),
            Anchor::BottomLeft => (m, fh - ih - m),
            Anchor::BottomRight => (fw - iw - m, fh - ih - m),
            Anchor::Center => ((fw - iw) / 2, (fh - ih) / 2),
        }
    }
}

fn default_opacity() -> f32 {
    0.8
}

fn default_scale() -> f32 {
    0.2
}

fn default_margin() -> u32 {
    24
}

fn default_border_color() -> [u8; 3] {
    [255, 255, 255]
}

fn default_border_width() -> u32 {
    16
}

/// Per-slide overlay settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    #[default]
    None,

    /// Image composited in a corner, honoring its alpha channel
    Watermark {
        path: PathBuf,
        #[serde(default)]
        anchor: Anchor,
        #[serde(default = "default_opacity")]
        opacity: f32,
        /// Watermark width as a fraction of the frame width
        #[serde(default = "default_scale")]
        scale: f32,
        #[serde(default = "default_margin")]
        margin: u32,
    },

    /// Solid frame around the slide
    Border {
        #[serde(default = "default_border_color")]
        color: [u8; 3],
        #[serde(default = "default_border_width")]
        width: u32,
    },
}

impl Overlay {
    pub fn is_none(&self) -> bool {
        matches!(self, Overlay::None)
    }

    /// Short description for logs and listings
    pub fn describe(&self) -> String {
        match self {
            Overlay::None => "none".to_string(),
            Overlay::Watermark { path, anchor, .. } => {
                format!("watermark {} ({:?})", path.display(), anchor)
            }
            Overlay::Border { width, .. } => format!("border {}px", width),
        }
    }

    /// Resolve a relative watermark path against `base`
    pub fn resolve_path(&mut self, base: &Path) {
        self.map_paths(|path| {
            if path.is_relative() {
                base.join(path)
            } else {
                path.to_path_buf()
            }
        });
    }

    /// Replace every file path the overlay refers to
    pub fn map_paths<F: Fn(&Path) -> PathBuf>(&mut self, f: F) {
        if let Overlay::Watermark { path, .. } = self {
            *path = f(path);
        }
    }

    /// Resolve the overlay for a given frame size, loading any images it needs
    pub fn prepare(&self, frame_size: (u32, u32)) -> Result<PreparedOverlay> {
        match self {
            Overlay::None => Ok(PreparedOverlay::None),
            Overlay::Watermark {
                path,
                anchor,
                opacity,
                scale,
                margin,
            } => {
                let source = image::open(path)
                    .map_err(|e| ImageError::LoadFailed {
                        path: path.display().to_string(),
                        reason: e.to_string(),
                    })?
                    .to_rgba8();

                let target_w = ((frame_size.0 as f32 * scale.clamp(0.01, 1.0)).round() as u32).max(1);
                let target_h = ((source.height() as u64 * target_w as u64) / source.width().max(1) as u64)
                    .max(1) as u32;
                let image = image::imageops::resize(&source, target_w, target_h, FilterType::Triangle);

                let position = anchor.position(frame_size, (target_w, target_h), *margin);
                debug!(
                    "Prepared watermark {} at {:?} ({}x{})",
                    path.display(),
                    position,
                    target_w,
                    target_h
                );

                Ok(PreparedOverlay::Watermark {
                    image,
                    position,
                    opacity: opacity.clamp(0.0, 1.0),
                })
            }
            Overlay::Border { color, width } => Ok(PreparedOverlay::Border {
                color: *color,
                width: *width,
            }),
        }
    }
}

/// Overlay ready to be drawn onto frames of a fixed size
#[derive(Debug, Clone)]
pub enum PreparedOverlay {
    None,
    Watermark {
        image: RgbaImage,
        position: (i64, i64),
        opacity: f32,
    },
    Border {
        color: [u8; 3],
        width: u32,
    },
}

impl PreparedOverlay {
    pub fn is_none(&self) -> bool {
        matches!(self, PreparedOverlay::None)
    }

    pub fn apply(&self, frame: &mut Frame) {
        match self {
            PreparedOverlay::None => {}
            PreparedOverlay::Watermark {
                image,
                position,
                opacity,
            } => draw_watermark(frame, image, *position, *opacity),
            PreparedOverlay::Border { color, width } => draw_border(frame, *color, *width),
        }
    }
}

fn draw_watermark(frame: &mut Frame, image: &RgbaImage, position: (i64, i64), opacity: f32) {
    let (fw, fh) = (frame.width() as i64, frame.height() as i64);

    for (x, y, pixel) in image.enumerate_pixels() {
        let tx = position.0 + x as i64;
        let ty = position.1 + y as i64;
        if tx < 0 || ty < 0 || tx >= fw || ty >= fh {
            continue;
        }

        let alpha = pixel[3] as f32 / 255.0 * opacity;
        if alpha <= 0.0 {
            continue;
        }

        let target = frame.get_pixel_mut(tx as u32, ty as u32);
        for c in 0..3 {
            let blended = pixel[c] as f32 * alpha + target[c] as f32 * (1.0 - alpha);
            target[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn draw_border(frame: &mut Frame, color: [u8; 3], width: u32) {
    let (fw, fh) = (frame.width(), frame.height());
    let width = width.min(fw / 2).min(fh / 2);
    if width == 0 {
        return;
    }

    for y in 0..fh {
        let horizontal_band = y < width || y >= fh - width;
        for x in 0..fw {
            if horizontal_band || x < width || x >= fw - width {
                frame.set_pixel(x, y, color);
            }
        }
    }
}
