//! Stabilized paths and per-run reports.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::estimate::GapPolicy;
use crate::motion::{Motion, TrajectoryPoint};

/// Output of the three trajectory passes over one motion sequence.
///
/// All three vectors have the same length as the input motions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StabilizedPath {
    /// Running sum of the input motions
    pub trajectory: Vec<TrajectoryPoint>,
    /// Windowed mean of `trajectory`
    pub smoothed: Vec<TrajectoryPoint>,
    /// Motions whose running sum reproduces `smoothed`
    pub corrected: Vec<Motion>,
    /// Per-frame warp that moves each frame from its raw position onto `smoothed`
    #[serde(default)]
    pub warps: Vec<Motion>,
}

impl StabilizedPath {
    pub fn len(&self) -> usize {
        self.corrected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.corrected.is_empty()
    }
}

/// Summary of a stabilization run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct StabilizationReport {
    /// Frames decoded from the input during motion analysis
    pub frames_read: usize,
    /// Frames encoded to the output
    pub frames_written: usize,
    /// Frame pairs for which no transform was found
    pub estimation_failures: usize,
    /// Mean number of tracked features per analysed pair
    pub average_tracked_points: f64,
    /// Smoothing radius in frames
    pub smoothing_radius: usize,
    /// Policy used for failed estimates
    pub gap_policy: GapPolicy,
    /// Input frame index each motion is applied to
    pub frame_indices: Vec<usize>,
    /// Gap-free frame-to-frame motions
    pub motions: Vec<Motion>,
    /// Trajectory passes computed from `motions`
    pub path: StabilizedPath,
}

impl StabilizationReport {
    /// Largest single-frame correction applied, in the units of each component.
    pub fn max_correction(&self) -> f64 {
        self.motions
            .iter()
            .zip(&self.path.warps)
            .map(|(raw, warp)| (*warp - *raw).max_abs())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report_round_trip() {
        let report = StabilizationReport::default();
        let json = serde_json::to_string(&report).unwrap();
        let back: StabilizationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.frames_read, 0);
        assert_eq!(back.gap_policy, GapPolicy::ReuseLast);
        assert!(back.path.is_empty());
    }

    #[test]
    fn test_max_correction() {
        let report = StabilizationReport {
            motions: vec![Motion::new(1.0, 0.0, 0.0), Motion::new(5.0, 0.0, 0.0)],
            path: StabilizedPath {
                trajectory: Vec::new(),
                smoothed: Vec::new(),
                corrected: Vec::new(),
                warps: vec![Motion::new(2.0, 0.0, 0.0), Motion::new(2.0, 0.5, 0.0)],
            },
            ..Default::default()
        };
        assert_eq!(report.max_correction(), 3.0);
    }

    #[test]
    fn test_report_schema() {
        let schema = schemars::schema_for!(StabilizationReport);
        let json = serde_json::to_value(&schema).unwrap();
        let properties = &json["properties"];
        assert!(properties.get("frames_written").is_some());
        assert!(properties.get("gap_policy").is_some());
        assert!(properties.get("path").is_some());
    }
}
