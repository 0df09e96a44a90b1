//! Stabilization progress reporting.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which pass over the video is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Pass {
    /// Reading frames and estimating motion
    #[default]
    Analyze,
    /// Warping and writing frames
    Render,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Analyze => write!(f, "analyze"),
            Pass::Render => write!(f, "render"),
        }
    }
}

/// Progress information for one pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StabilizeProgress {
    /// Current pass
    pub pass: Pass,
    /// Frames handled so far in this pass
    pub frame: u64,
    /// Frames expected in this pass (0 when the container does not say)
    pub total_frames: u64,
    /// Features tracked for the latest pair (analysis only)
    pub tracked_points: usize,
    /// Running mean of tracked features (analysis only)
    pub average_tracked_points: f64,
}

impl StabilizeProgress {
    /// Calculate progress percentage within the current pass.
    pub fn percentage(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        ((self.frame as f64 / self.total_frames as f64) * 100.0).min(100.0)
    }

    /// Progress across both passes, analysis counting as the first half.
    pub fn overall_percentage(&self) -> f64 {
        let half = self.percentage() / 2.0;
        match self.pass {
            Pass::Analyze => half,
            Pass::Render => 50.0 + half,
        }
    }
}

/// Callback type for progress updates.
pub type ProgressCallback = Box<dyn Fn(StabilizeProgress) + Send + Sync + 'static>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percentage() {
        let progress = StabilizeProgress {
            frame: 50,
            total_frames: 200,
            ..Default::default()
        };
        assert!((progress.percentage() - 25.0).abs() < 0.01);
        assert!((progress.overall_percentage() - 12.5).abs() < 0.01);
    }

    #[test]
    fn test_render_pass_is_second_half() {
        let progress = StabilizeProgress {
            pass: Pass::Render,
            frame: 200,
            total_frames: 200,
            ..Default::default()
        };
        assert!((progress.overall_percentage() - 100.0).abs() < 0.01);
    }

    #[test]
    fn test_unknown_total() {
        let progress = StabilizeProgress {
            frame: 10,
            ..Default::default()
        };
        assert_eq!(progress.percentage(), 0.0);
    }

    #[test]
    fn test_percentage_is_capped() {
        // Frame counts from containers are estimates and can be exceeded.
        let progress = StabilizeProgress {
            frame: 120,
            total_frames: 100,
            ..Default::default()
        };
        assert_eq!(progress.percentage(), 100.0);
    }
}
