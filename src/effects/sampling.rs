use image::RgbImage;

use crate::error::{Result, VideoError};
use crate::video::types::Frame;

/// Bilinearly resample a sub-window of `src` into a new frame of `out_size`.
///
/// `origin` and `size` are in source pixels and may be fractional, which keeps
/// slow zooms and pans free of the one-pixel stepping an integer crop shows.
pub(crate) fn resample_window(
    src: &Frame,
    origin: (f64, f64),
    size: (f64, f64),
    out_size: (u32, u32),
) -> Result<Frame> {
    let (src_w, src_h) = (src.width() as usize, src.height() as usize);
    let (out_w, out_h) = (out_size.0 as usize, out_size.1 as usize);
    if src_w == 0 || src_h == 0 || out_w == 0 || out_h == 0 {
        return Err(VideoError::FrameProcessingFailed {
            reason: "cannot resample an empty frame".to_string(),
        }
        .into());
    }

    let data = src.as_bytes();
    let step_x = size.0 / out_w as f64;
    let step_y = size.1 / out_h as f64;
    let max_x = (src_w - 1) as f64;
    let max_y = (src_h - 1) as f64;

    let mut out = vec![0u8; out_w * out_h * 3];

    for oy in 0..out_h {
        let fy = (origin.1 + (oy as f64 + 0.5) * step_y - 0.5).clamp(0.0, max_y);
        let y0 = fy.floor() as usize;
        let y1 = (y0 + 1).min(src_h - 1);
        let wy = fy - y0 as f64;

        for ox in 0..out_w {
            let fx = (origin.0 + (ox as f64 + 0.5) * step_x - 0.5).clamp(0.0, max_x);
            let x0 = fx.floor() as usize;
            let x1 = (x0 + 1).min(src_w - 1);
            let wx = fx - x0 as f64;

            let i00 = (y0 * src_w + x0) * 3;
            let i10 = (y0 * src_w + x1) * 3;
            let i01 = (y1 * src_w + x0) * 3;
            let i11 = (y1 * src_w + x1) * 3;
            let o = (oy * out_w + ox) * 3;

            for c in 0..3 {
                let top = data[i00 + c] as f64 + (data[i10 + c] as f64 - data[i00 + c] as f64) * wx;
                let bottom = data[i01 + c] as f64 + (data[i11 + c] as f64 - data[i01 + c] as f64) * wx;
                out[o + c] = (top + (bottom - top) * wy).round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    RgbImage::from_raw(out_size.0, out_size.1, out)
        .map(Frame::new)
        .ok_or_else(|| {
            VideoError::FrameProcessingFailed {
                reason: "resampled buffer has the wrong size".to_string(),
            }
            .into()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_window_keeps_pixels() {
        let mut frame = Frame::new_black(4, 4);
        frame.set_pixel(1, 2, [10, 20, 30]);

        let out = resample_window(&frame, (0.0, 0.0), (4.0, 4.0), (4, 4)).unwrap();
        assert_eq!(out.get_pixel(1, 2), [10, 20, 30]);
        assert_eq!(out.get_pixel(0, 0), [0, 0, 0]);
    }

    #[test]
    fn test_upscaled_window_of_flat_color() {
        let frame = Frame::new_filled(8, 8, [90, 90, 90]);
        let out = resample_window(&frame, (2.0, 2.0), (4.0, 4.0), (8, 8)).unwrap();

        assert_eq!(out.width(), 8);
        assert_eq!(out.get_pixel(7, 7), [90, 90, 90]);
    }
}
