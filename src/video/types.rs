use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a single video frame
///
/// This is a simple wrapper around an RGB image buffer that provides
/// convenient methods for the pixel work done by effects and the compositor.
#[derive(Clone, Debug)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a new frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with black
    pub fn new_black(width: u32, height: u32) -> Self {
        let buffer = ImageBuffer::new(width, height);
        Self { buffer }
    }

    /// Create a new frame with the given dimensions filled with the specified color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_pixel(width, height, Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Get a pixel at the given coordinates (returns RGB array)
    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        self.buffer.get_pixel(x, y).0
    }

    /// Get a mutable reference to a pixel at the given coordinates
    pub fn get_pixel_mut(&mut self, x: u32, y: u32) -> &mut [u8] {
        &mut self.buffer.get_pixel_mut(x, y).0
    }

    /// Set a pixel at the given coordinates
    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Get the underlying image buffer
    pub fn as_image(&self) -> &RgbImage {
        &self.buffer
    }

    /// Get a mutable reference to the underlying image buffer
    pub fn as_image_mut(&mut self) -> &mut RgbImage {
        &mut self.buffer
    }

    /// Consume the frame and return the image buffer
    pub fn into_image(self) -> RgbImage {
        self.buffer
    }

    /// Raw packed RGB24 bytes, row-major
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Create a frame from raw RGB bytes
    pub fn from_rgb_bytes(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Save the frame as a PNG file
    pub fn save_png<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), image::ImageError> {
        self.buffer.save(path)
    }

    /// Blend `layer` on top of this frame at `offset` with a constant opacity.
    ///
    /// Parts of the layer that fall outside the frame are clipped.
    pub fn composite(&mut self, layer: &Frame, offset: (i32, i32), opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }

        let (dst_w, dst_h) = (self.width() as i32, self.height() as i32);
        let (src_w, src_h) = (layer.width() as i32, layer.height() as i32);

        let x0 = offset.0.max(0);
        let y0 = offset.1.max(0);
        let x1 = (offset.0 + src_w).min(dst_w);
        let y1 = (offset.1 + src_h).min(dst_h);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        // Fixed-point weights, 256 == fully opaque
        let alpha = (opacity * 256.0).round() as u32;
        let inv = 256 - alpha;

        let dst_stride = dst_w as usize * 3;
        let src_stride = src_w as usize * 3;
        let row_len = (x1 - x0) as usize * 3;
        let src = layer.buffer.as_raw();
        let dst: &mut [u8] = &mut self.buffer;

        for y in y0..y1 {
            let sy = (y - offset.1) as usize;
            let sx = (x0 - offset.0) as usize;
            let s_start = sy * src_stride + sx * 3;
            let d_start = y as usize * dst_stride + x0 as usize * 3;

            let s = &src[s_start..s_start + row_len];
            let d = &mut dst[d_start..d_start + row_len];

            if alpha >= 256 {
                d.copy_from_slice(s);
            } else {
                for (dp, sp) in d.iter_mut().zip(s) {
                    *dp = ((*sp as u32 * alpha + *dp as u32 * inv) >> 8) as u8;
                }
            }
        }
    }
}

/// Output aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Widescreen,
    #[serde(rename = "4:3")]
    Standard,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "21:9")]
    Ultrawide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Widescreen,
        AspectRatio::Standard,
        AspectRatio::Square,
        AspectRatio::Portrait,
        AspectRatio::Ultrawide,
    ];

    /// The ratio as (width units, height units)
    pub fn ratio(&self) -> (u32, u32) {
        match self {
            AspectRatio::Widescreen => (16, 9),
            AspectRatio::Standard => (4, 3),
            AspectRatio::Square => (1, 1),
            AspectRatio::Portrait => (9, 16),
            AspectRatio::Ultrawide => (21, 9),
        }
    }

    /// Output dimensions for the given base size.
    ///
    /// The base is the short side: the height of landscape and square
    /// outputs, the width of portrait ones. Both sides are even so the
    /// frames can be encoded as yuv420p. 21:9 follows the common 2560x1080
    /// ultrawide size rather than the exact ratio.
    pub fn dimensions(&self, base: u32) -> (u32, u32) {
        let (w, h) = match self {
            AspectRatio::Ultrawide => (64, 27),
            _ => self.ratio(),
        };
        let (width, height) = if w >= h {
            (base as u64 * w as u64 / h as u64, base as u64)
        } else {
            (base as u64, base as u64 * h as u64 / w as u64)
        };
        (make_even(width as u32), make_even(height as u32))
    }
}

fn make_even(value: u32) -> u32 {
    (value / 2 * 2).max(2)
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.ratio();
        write!(f, "{}:{}", w, h)
    }
}

impl FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        AspectRatio::ALL
            .into_iter()
            .find(|ratio| ratio.to_string() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown aspect ratio '{}' (expected one of 16:9, 4:3, 1:1, 9:16, 21:9)",
                    s
                )
            })
    }
}

/// Output quality preset, mapped to a target video bitrate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
    #[serde(alias = "Very High", alias = "very-high")]
    VeryHigh,
}

impl Quality {
    pub const ALL: [Quality; 4] = [Quality::Low, Quality::Medium, Quality::High, Quality::VeryHigh];

    /// Target bitrate in kbps
    pub fn bitrate_kbps(&self) -> u32 {
        match self {
            Quality::Low => 1000,
            Quality::Medium => 2000,
            Quality::High => 5000,
            Quality::VeryHigh => 10000,
        }
    }

    /// Rough output size in megabytes for a video of `duration` seconds
    pub fn estimated_size_mb(&self, duration: f64) -> f64 {
        let bytes_per_second = self.bitrate_kbps() as f64 * 1000.0 / 8.0;
        duration * bytes_per_second / (1024.0 * 1024.0)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Low => "low",
            Quality::Medium => "medium",
            Quality::High => "high",
            Quality::VeryHigh => "very_high",
        };
        f.write_str(name)
    }
}

impl FromStr for Quality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        Quality::ALL
            .into_iter()
            .find(|quality| quality.to_string() == normalized)
            .ok_or_else(|| format!("unknown quality '{}' (expected low, medium, high, very_high)", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aspect_ratio_dimensions() {
        assert_eq!(AspectRatio::Widescreen.dimensions(1080), (1920, 1080));
        assert_eq!(AspectRatio::Standard.dimensions(1080), (1440, 1080));
        assert_eq!(AspectRatio::Square.dimensions(1080), (1080, 1080));
        assert_eq!(AspectRatio::Portrait.dimensions(1080), (1080, 1920));
        assert_eq!(AspectRatio::Ultrawide.dimensions(1080), (2560, 1080));
        assert_eq!(AspectRatio::Ultrawide.dimensions(720), (1706, 720));
        assert_eq!(AspectRatio::Ultrawide.to_string(), "21:9");
    }

    #[test]
    fn test_dimensions_are_even() {
        let (w, h) = AspectRatio::Widescreen.dimensions(101);
        assert_eq!(w % 2, 0);
        assert_eq!(h % 2, 0);
    }

    #[test]
    fn test_parse_aspect_and_quality() {
        assert_eq!("9:16".parse::<AspectRatio>().unwrap(), AspectRatio::Portrait);
        assert!("3:2".parse::<AspectRatio>().is_err());

        assert_eq!("Very High".parse::<Quality>().unwrap(), Quality::VeryHigh);
        assert_eq!("low".parse::<Quality>().unwrap(), Quality::Low);
        assert!("ultra".parse::<Quality>().is_err());
    }

    #[test]
    fn test_estimated_size() {
        // 5000 kbps for 8 minutes and a bit is roughly 300 MB
        let mb = Quality::High.estimated_size_mb(503.3165);
        assert!((mb - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_composite_full_opacity_copies() {
        let mut base = Frame::new_black(4, 4);
        let layer = Frame::new_filled(2, 2, [200, 100, 50]);

        base.composite(&layer, (1, 1), 1.0);

        assert_eq!(base.get_pixel(0, 0), [0, 0, 0]);
        assert_eq!(base.get_pixel(1, 1), [200, 100, 50]);
        assert_eq!(base.get_pixel(2, 2), [200, 100, 50]);
        assert_eq!(base.get_pixel(3, 3), [0, 0, 0]);
    }

    #[test]
    fn test_composite_half_opacity_blends() {
        let mut base = Frame::new_black(2, 2);
        let layer = Frame::new_filled(2, 2, [200, 200, 200]);

        base.composite(&layer, (0, 0), 0.5);

        assert_eq!(base.get_pixel(0, 0), [100, 100, 100]);
    }

    #[test]
    fn test_composite_clips_offscreen_layers() {
        let mut base = Frame::new_black(4, 4);
        let layer = Frame::new_filled(4, 4, [255, 255, 255]);

        base.composite(&layer, (-3, 0), 1.0);
        assert_eq!(base.get_pixel(0, 0), [255, 255, 255]);
        assert_eq!(base.get_pixel(1, 0), [0, 0, 0]);

        // Completely outside: untouched
        let mut base = Frame::new_black(4, 4);
        base.composite(&layer, (10, 10), 1.0);
        assert_eq!(base.get_pixel(3, 3), [0, 0, 0]);
    }
}
