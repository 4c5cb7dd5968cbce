use thiserror::Error;

/// Main error type for the slideshow maker library
#[derive(Error, Debug)]
pub enum SlideshowError {
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Composition error: {0}")]
    Composition(#[from] CompositionError),

    #[error("Effect error: {0}")]
    Effect(#[from] EffectError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Project error: {0}")]
    Project(#[from] ProjectError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Generic error: {0}")]
    Generic(String),
}

/// Image loading and slide list errors
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("Failed to load image: {path} ({reason})")]
    LoadFailed { path: String, reason: String },

    #[error("Unsupported image format: {path}")]
    UnsupportedFormat { path: String },

    #[error("No images found in directory: {path}")]
    NoImagesFound { path: String },

    #[error("Slide index {index} out of range (list has {len} slides)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid slide settings for {path}: {details}")]
    InvalidSettings { path: String, details: String },
}

/// Video rendering and encoding errors
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Video encoding failed: {reason}")]
    EncodingFailed { reason: String },

    #[error("Frame processing failed: {reason}")]
    FrameProcessingFailed { reason: String },

    #[error("Frame sink error: {reason}")]
    SinkFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Composition pipeline errors
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("No images provided")]
    NoImages,

    #[error("Timeline generation failed: {reason}")]
    TimelineFailed { reason: String },

    #[error("Output generation failed: {reason}")]
    OutputFailed { reason: String },

    #[error("Preview time {time:.2}s is outside the slideshow (0-{duration:.2}s)")]
    PreviewOutOfRange { time: f64, duration: f64 },
}

/// Effect, transition and profile errors
#[derive(Error, Debug)]
pub enum EffectError {
    #[error("Effect not found: {name}")]
    NotFound { name: String },

    #[error("Unknown transition: {name}")]
    UnknownTransition { name: String },

    #[error("Profile not found: {name}")]
    ProfileNotFound { name: String },

    #[error("Effect application failed: {effect} - {reason}")]
    EffectFailed { effect: String, reason: String },

    #[error("Effect configuration invalid: {details}")]
    InvalidConfig { details: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Project file errors
#[derive(Error, Debug)]
pub enum ProjectError {
    #[error("Project file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse project file: {path} ({reason})")]
    ParseFailed { path: String, reason: String },

    #[error("Failed to serialize project: {reason}")]
    SerializeFailed { reason: String },
}

/// Convenience type alias for Results using SlideshowError
pub type Result<T> = std::result::Result<T, SlideshowError>;

impl SlideshowError {
    /// Create a generic error with a custom message
    pub fn generic<S: Into<String>>(message: S) -> Self {
        Self::Generic(message.into())
    }

    /// Check if this error is recoverable (can be retried)
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Image(ImageError::LoadFailed { .. }) => true,
            Self::Video(VideoError::EncodingFailed { .. }) => true,
            _ => false,
        }
    }

    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Image(ImageError::LoadFailed { path, .. }) => {
                format!("Could not load image '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Composition(CompositionError::NoImages) => {
                "Please add at least one image before generating a video.".to_string()
            }
            Self::Effect(EffectError::NotFound { name }) => {
                format!("Effect '{}' not found. Run `slideshow-maker list` to see available effects.", name)
            }
            Self::Effect(EffectError::ProfileNotFound { name }) => {
                format!("Profile '{}' not found. Run `slideshow-maker list` to see available profiles.", name)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Project(ProjectError::FileNotFound { path }) => {
                format!("Project file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_for_missing_image() {
        let err: SlideshowError = ImageError::LoadFailed {
            path: "missing.jpg".to_string(),
            reason: "not found".to_string(),
        }
        .into();

        assert!(err.user_message().contains("missing.jpg"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_no_images_is_permanent() {
        let err: SlideshowError = CompositionError::NoImages.into();
        assert!(!err.is_recoverable());
        assert!(err.user_message().contains("at least one image"));
    }
}
