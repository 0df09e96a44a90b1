//! Windowed averaging of a trajectory.
//!
//! The window for index `i` is `[i - radius, i + radius]` clipped to the
//! sequence, so it narrows near both ends. Out-of-range indices are never
//! padded, wrapped or reflected.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use stab_models::TrajectoryPoint;
use std::fmt;
use std::str::FromStr;

use crate::error::MediaError;

/// How the windowed average is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SmoothingMethod {
    /// Sum every window from scratch, O(N·R).
    #[default]
    Window,
    /// Slide one running sum across the sequence, O(N).
    ///
    /// The sum is updated by adding and subtracting points, so results can
    /// differ from `Window` in the last bits. Compare with a tolerance.
    Running,
    /// Same arithmetic as `Window`, output indices split across threads.
    Parallel,
}

impl SmoothingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SmoothingMethod::Window => "window",
            SmoothingMethod::Running => "running",
            SmoothingMethod::Parallel => "parallel",
        }
    }

    pub fn apply(&self, trajectory: &[TrajectoryPoint], radius: usize) -> Vec<TrajectoryPoint> {
        match self {
            SmoothingMethod::Window => smooth(trajectory, radius),
            SmoothingMethod::Running => smooth_running(trajectory, radius),
            SmoothingMethod::Parallel => smooth_parallel(trajectory, radius),
        }
    }
}

impl fmt::Display for SmoothingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SmoothingMethod {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "window" | "naive" => Ok(SmoothingMethod::Window),
            "running" | "prefix" | "prefix_sum" => Ok(SmoothingMethod::Running),
            "parallel" | "rayon" => Ok(SmoothingMethod::Parallel),
            other => Err(MediaError::invalid_config(format!(
                "unknown smoothing method: {other}"
            ))),
        }
    }
}

/// Clipped window bounds `[lo, hi)` around `index`.
fn window_bounds(index: usize, radius: usize, len: usize) -> (usize, usize) {
    (
        index.saturating_sub(radius),
        index.saturating_add(radius).saturating_add(1).min(len),
    )
}

fn window_mean(trajectory: &[TrajectoryPoint], index: usize, radius: usize) -> TrajectoryPoint {
    let (lo, hi) = window_bounds(index, radius, trajectory.len());
    let sum = trajectory[lo..hi]
        .iter()
        .fold(TrajectoryPoint::origin(), |acc, p| acc + *p);
    TrajectoryPoint::mean_of(sum, hi - lo)
}

/// Mean of every clipped window, computed independently per index.
pub fn smooth(trajectory: &[TrajectoryPoint], radius: usize) -> Vec<TrajectoryPoint> {
    (0..trajectory.len())
        .map(|i| window_mean(trajectory, i, radius))
        .collect()
}

/// Parallel version of [`smooth`]; results are bit-identical.
pub fn smooth_parallel(trajectory: &[TrajectoryPoint], radius: usize) -> Vec<TrajectoryPoint> {
    (0..trajectory.len())
        .into_par_iter()
        .map(|i| window_mean(trajectory, i, radius))
        .collect()
}

/// Sliding running-sum version of [`smooth`].
///
/// Uses the same window membership and divisor. Results agree with [`smooth`]
/// up to floating-point rounding; radius 0 returns the input unchanged.
pub fn smooth_running(trajectory: &[TrajectoryPoint], radius: usize) -> Vec<TrajectoryPoint> {
    if radius == 0 {
        return trajectory.to_vec();
    }

    let len = trajectory.len();
    let mut result = Vec::with_capacity(len);
    let mut sum = TrajectoryPoint::origin();
    // Current window is trajectory[lo..hi].
    let (mut lo, mut hi) = (0usize, 0usize);

    for i in 0..len {
        let (want_lo, want_hi) = window_bounds(i, radius, len);
        while hi < want_hi {
            sum = sum + trajectory[hi];
            hi += 1;
        }
        while lo < want_lo {
            let p = trajectory[lo];
            sum = TrajectoryPoint::new(sum.x - p.x, sum.y - p.y, sum.a - p.a);
            lo += 1;
        }
        result.push(TrajectoryPoint::mean_of(sum, hi - lo));
    }

    result
}
