//! Motion estimates and the policy for filling failed ones.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::motion::Motion;

/// Result of estimating the motion between a reference frame and the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameEstimate {
    /// Index of the reference frame the motion starts from
    pub from_frame: usize,
    /// Index of the frame the motion ends at
    pub to_frame: usize,
    /// Estimated motion, `None` when no rigid transform could be fitted
    pub motion: Option<Motion>,
    /// Number of features successfully tracked between the two frames
    pub tracked_points: usize,
}

impl FrameEstimate {
    /// A successful estimate.
    pub fn found(from_frame: usize, to_frame: usize, motion: Motion, tracked_points: usize) -> Self {
        Self {
            from_frame,
            to_frame,
            motion: Some(motion),
            tracked_points,
        }
    }

    /// A failed estimate.
    pub fn missing(from_frame: usize, to_frame: usize, tracked_points: usize) -> Self {
        Self {
            from_frame,
            to_frame,
            motion: None,
            tracked_points,
        }
    }

    pub fn is_found(&self) -> bool {
        self.motion.is_some()
    }
}

/// What to substitute when no transform was found for a frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum GapPolicy {
    /// Repeat the most recent valid motion (identity before the first one).
    #[default]
    ReuseLast,

    /// Assume the camera did not move.
    Identity,

    /// Drop the frame and estimate the next one against the last kept frame.
    Skip,
}

impl GapPolicy {
    /// Returns the policy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            GapPolicy::ReuseLast => "reuse_last",
            GapPolicy::Identity => "identity",
            GapPolicy::Skip => "skip",
        }
    }

    /// Whether the reference frame advances past a failed estimate.
    ///
    /// Only `Skip` holds on to the previous reference frame.
    pub fn advances_on_failure(&self) -> bool {
        !matches!(self, GapPolicy::Skip)
    }
}

impl fmt::Display for GapPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GapPolicy {
    type Err = GapPolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reuse_last" | "reuse" | "last" => Ok(GapPolicy::ReuseLast),
            "identity" | "zero" => Ok(GapPolicy::Identity),
            "skip" | "drop" => Ok(GapPolicy::Skip),
            _ => Err(GapPolicyParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown gap policy: {0}")]
pub struct GapPolicyParseError(String);
