use std::path::{Path, PathBuf};

use image::{imageops::FilterType, GenericImageView};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ImageError, Result};
use crate::video::types::Frame;

/// File extensions the loader accepts (lowercase, without the dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "tiff", "tif"];

/// Decodes images and fits them onto the output canvas
pub struct ImageLoader {
    frame_size: (u32, u32),
    background: [u8; 3],
}

impl ImageLoader {
    pub fn new(frame_size: (u32, u32), background: [u8; 3]) -> Self {
        Self {
            frame_size,
            background,
        }
    }

    /// Whether the path has a supported image extension
    pub fn has_supported_extension<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    /// Whether the path is an existing file with a supported extension
    pub fn is_valid_image_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.is_file() && Self::has_supported_extension(path)
    }

    /// List the images in `dir`, sorted by file name
    pub fn discover<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImageError::NoImagesFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        let mut images = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if Self::is_valid_image_file(&path) {
                images.push(path);
            } else if path.is_file() {
                debug!("Skipping non-image file: {:?}", path);
            }
        }

        if images.is_empty() {
            return Err(ImageError::NoImagesFound {
                path: dir.display().to_string(),
            }
            .into());
        }

        images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        info!("Discovered {} images in {:?}", images.len(), dir);
        Ok(images)
    }

    /// Decode an image and fit it onto the canvas
    ///
    /// The image is scaled (up or down) until it touches the canvas on one
    /// axis, keeping its aspect ratio, and centered on the background color.
    pub fn load_fitted<P: AsRef<Path>>(&self, path: P) -> Result<Frame> {
        let path = path.as_ref();
        if !Self::has_supported_extension(path) {
            return Err(ImageError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into());
        }

        let image = image::open(path).map_err(|e| ImageError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let (src_w, src_h) = image.dimensions();
        let (fit_w, fit_h) = fit_within((src_w, src_h), self.frame_size);
        debug!(
            "Fitting {:?}: {}x{} -> {}x{}",
            path.file_name().unwrap_or_default(),
            src_w,
            src_h,
            fit_w,
            fit_h
        );

        let rgb = image.to_rgb8();
        let resized = if (fit_w, fit_h) == (src_w, src_h) {
            rgb
        } else {
            image::imageops::resize(&rgb, fit_w, fit_h, FilterType::Lanczos3)
        };

        let mut canvas = Frame::new_filled(self.frame_size.0, self.frame_size.1, self.background);
        let offset = (
            ((self.frame_size.0 - fit_w) / 2) as i32,
            ((self.frame_size.1 - fit_h) / 2) as i32,
        );
        canvas.composite(&Frame::new(resized), offset, 1.0);
        Ok(canvas)
    }

    /// Load many images in parallel, preserving order
    pub fn load_all(&self, paths: &[PathBuf]) -> Result<Vec<Frame>> {
        info!("Loading {} images at {}x{}", paths.len(), self.frame_size.0, self.frame_size.1);

        paths
            .par_iter()
            .map(|path| {
                self.load_fitted(path).map_err(|e| {
                    warn!("Failed to load {:?}: {}", path, e);
                    e
                })
            })
            .collect()
    }
}

/// Largest size with the aspect ratio of `source` that fits inside `bounds`
pub fn fit_within(source: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (sw, sh) = (source.0.max(1) as f64, source.1.max(1) as f64);
    let scale = (bounds.0 as f64 / sw).min(bounds.1 as f64 / sh);

    let w = ((sw * scale).round() as u32).clamp(1, bounds.0);
    let h = ((sh * scale).round() as u32).clamp(1, bounds.1);
    (w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    #[test]
    fn test_fit_within() {
        assert_eq!(fit_within((4000, 3000), (1920, 1080)), (1440, 1080));
        assert_eq!(fit_within((1080, 1920), (1920, 1080)), (608, 1080));
        assert_eq!(fit_within((100, 50), (1920, 1080)), (1920, 960));
        assert_eq!(fit_within((1920, 1080), (1920, 1080)), (1920, 1080));
    }

    #[test]
    fn test_supported_extensions() {
        assert!(ImageLoader::has_supported_extension("a/b/photo.JPG"));
        assert!(ImageLoader::has_supported_extension("scan.tiff"));
        assert!(!ImageLoader::has_supported_extension("notes.txt"));
        assert!(!ImageLoader::has_supported_extension("no_extension"));
    }

    #[test]
    fn test_discover_sorts_and_filters() {
        let dir = tempdir().unwrap();
        for name in ["02_b.png", "01_a.png", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let images = ImageLoader::discover(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["01_a.png", "02_b.png"]);
    }

    #[test]
    fn test_discover_empty_directory() {
        let dir = tempdir().unwrap();
        assert!(ImageLoader::discover(dir.path()).is_err());
    }

    #[test]
    fn test_load_fitted_letterboxes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("square.png");
        RgbImage::from_pixel(10, 10, Rgb([0, 255, 0])).save(&path).unwrap();

        let loader = ImageLoader::new((40, 20), [0, 0, 0]);
        let frame = loader.load_fitted(&path).unwrap();

        assert_eq!((frame.width(), frame.height()), (40, 20));
        // Pillarboxed: 20x20 in the middle, black bars on the sides
        assert_eq!(frame.get_pixel(0, 10), [0, 0, 0]);
        assert_eq!(frame.get_pixel(20, 10), [0, 255, 0]);
        assert_eq!(frame.get_pixel(39, 10), [0, 0, 0]);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = ImageLoader::new((40, 20), [0, 0, 0]);
        assert!(loader.load_fitted("/no/such/photo.jpg").is_err());
        assert!(loader.load_fitted("/no/such/clip.mp4").is_err());
    }
}
