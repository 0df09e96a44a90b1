//! Configuration for the stabilization pipeline.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use stab_models::GapPolicy;

use crate::error::{MediaError, MediaResult};
use crate::trajectory::SmoothingMethod;

/// Default smoothing radius in frames.
pub const DEFAULT_SMOOTHING_RADIUS: usize = 30;
/// Default FourCC for the stabilized output.
pub const DEFAULT_OUTPUT_FOURCC: &str = "mp4v";

/// Configuration for one stabilization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizeConfig {
    // === Trajectory ===
    /// Half-width of the averaging window in frames (default: 30).
    /// Larger values give a steadier but less reactive camera.
    pub smoothing_radius: usize,

    /// How the windowed average is computed (default: window)
    pub smoothing_method: SmoothingMethod,

    // === Feature Tracking ===
    /// Maximum Shi-Tomasi corners per frame (default: 200)
    pub max_corners: i32,

    /// Minimum corner quality relative to the best corner (default: 0.01)
    pub quality_level: f64,

    /// Minimum distance between corners in pixels (default: 30.0)
    pub min_distance: f64,

    /// Fewer tracked points than this counts as a failed estimate (default: 10)
    pub min_tracked_points: usize,

    /// What to do with a frame pair that has no transform (default: reuse_last)
    pub gap_policy: GapPolicy,

    // === Rendering ===
    /// Pixels cropped from the left and right edges before scaling back up.
    /// The vertical crop keeps the aspect ratio. 0 disables cropping.
    pub border_crop: u32,

    /// FourCC code for the output writer (default: "mp4v")
    pub output_fourcc: String,

    /// Output frame rate, `None` to reuse the source rate
    pub output_fps: Option<f64>,

    /// Write the original and stabilized frames side by side
    pub side_by_side: bool,

    // === Diagnostics ===
    /// Directory for transform and trajectory logs, `None` to skip
    pub export_dir: Option<PathBuf>,
}

impl Default for StabilizeConfig {
    fn default() -> Self {
        Self {
            smoothing_radius: DEFAULT_SMOOTHING_RADIUS,
            smoothing_method: SmoothingMethod::default(),

            max_corners: 200,
            quality_level: 0.01,
            min_distance: 30.0,
            min_tracked_points: 10,
            gap_policy: GapPolicy::default(),

            border_crop: 0,
            output_fourcc: DEFAULT_OUTPUT_FOURCC.to_string(),
            output_fps: None,
            side_by_side: false,

            export_dir: None,
        }
    }
}

impl StabilizeConfig {
    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges before a run starts.
    pub fn validate(&self) -> MediaResult<()> {
        if self.max_corners <= 0 {
            return Err(MediaError::invalid_config("max_corners must be positive"));
        }
        if !(self.quality_level > 0.0 && self.quality_level <= 1.0) {
            return Err(MediaError::invalid_config(
                "quality_level must be in (0, 1]",
            ));
        }
        if !(self.min_distance >= 0.0) {
            return Err(MediaError::invalid_config(
                "min_distance must be non-negative",
            ));
        }
        if self.output_fourcc.chars().count() != 4 {
            return Err(MediaError::invalid_config(format!(
                "output_fourcc must be 4 characters, got {:?}",
                self.output_fourcc
            )));
        }
        if let Some(fps) = self.output_fps {
            if !(fps.is_finite() && fps > 0.0) {
                return Err(MediaError::invalid_config("output_fps must be positive"));
            }
        }
        Ok(())
    }

    /// FourCC characters for the output writer.
    pub fn fourcc_chars(&self) -> [char; 4] {
        let mut chars = ['m', 'p', '4', 'v'];
        for (slot, c) in chars.iter_mut().zip(self.output_fourcc.chars()) {
            *slot = c;
        }
        chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = StabilizeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing_radius, 30);
        assert_eq!(config.gap_policy, GapPolicy::ReuseLast);
        assert_eq!(config.fourcc_chars(), ['m', 'p', '4', 'v']);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let bad_fourcc = StabilizeConfig {
            output_fourcc: "H26".to_string(),
            ..Default::default()
        };
        assert!(bad_fourcc.validate().is_err());

        let bad_quality = StabilizeConfig {
            quality_level: 0.0,
            ..Default::default()
        };
        assert!(bad_quality.validate().is_err());

        let bad_fps = StabilizeConfig {
            output_fps: Some(f64::NAN),
            ..Default::default()
        };
        assert!(bad_fps.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"smoothing_radius": 50, "gap_policy": "skip", "output_fourcc": "H264"}}"#
        )
        .unwrap();

        let config = StabilizeConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.smoothing_radius, 50);
        assert_eq!(config.gap_policy, GapPolicy::Skip);
        assert_eq!(config.fourcc_chars(), ['H', '2', '6', '4']);
        assert_eq!(config.max_corners, 200);
    }

    #[test]
    fn test_missing_file() {
        let err = StabilizeConfig::from_json_file("/nonexistent/videostab.json").unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }
}
