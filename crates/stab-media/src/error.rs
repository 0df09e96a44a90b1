//! Error types for stabilization.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for stabilization operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while stabilizing a video.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Cannot open video {path}: {message}")]
    VideoOpen { path: PathBuf, message: String },

    #[error("Failed to write frame: {0}")]
    VideoWrite(String),

    #[error("Video has {frames} frame(s), at least 2 are required")]
    NotEnoughFrames { frames: usize },

    #[error("No frame pair produced a usable transform")]
    NoUsableMotion,

    #[error("Motion at index {index} is not finite")]
    InvalidMotion { index: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("OpenCV error: {0}")]
    Opencv(String),

    #[error("Built without OpenCV support")]
    OpencvUnavailable,

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create a video open error.
    pub fn video_open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VideoOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an OpenCV failure error.
    pub fn opencv(message: impl Into<String>) -> Self {
        Self::Opencv(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

/// Map an OpenCV error into [`MediaError::Opencv`] with a short context label.
#[cfg(feature = "opencv")]
pub(crate) fn cv_err(context: &'static str) -> impl Fn(opencv::Error) -> MediaError {
    move |e| MediaError::opencv(format!("{context}: {e}"))
}
