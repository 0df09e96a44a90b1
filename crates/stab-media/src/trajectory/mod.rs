//! Camera trajectory smoothing.
//!
//! Stabilization runs three batch passes over a gap-free motion sequence:
//! 1. Accumulate frame-to-frame motions into a trajectory
//! 2. Average the trajectory over a symmetric window of `radius` frames
//! 3. Re-derive per-frame motions whose running sum follows the smoothed trajectory
//!
//! Alongside the re-derived motions, [`frame_warps`] gives the transform that
//! places each individual frame on the smoothed trajectory; that is what the
//! renderer applies.
//!
//! Each pass returns a fresh vector; nothing is mutated in place.

mod gaps;
mod smooth;

pub use gaps::{fill_gaps, GapFill};
pub use smooth::{smooth, smooth_parallel, smooth_running, SmoothingMethod};

use stab_models::{Motion, StabilizedPath, TrajectoryPoint};

use crate::error::{MediaError, MediaResult};

/// Running sum of `motions`, one point per motion.
pub fn accumulate(motions: &[Motion]) -> Vec<TrajectoryPoint> {
    motions
        .iter()
        .scan(TrajectoryPoint::origin(), |position, motion| {
            *position = *position + *motion;
            Some(*position)
        })
        .collect()
}

/// Motions that move the camera along `smoothed` instead of the raw path.
///
/// Walks the raw running sum again. At each frame the gap `smoothed - raw` is
/// measured and the motion is shifted by how much that gap changed since the
/// previous frame, so the running sum of the result lands on `smoothed`.
pub fn rederive(motions: &[Motion], smoothed: &[TrajectoryPoint]) -> Vec<Motion> {
    debug_assert_eq!(motions.len(), smoothed.len());

    motions
        .iter()
        .zip(smoothed)
        .scan(
            (TrajectoryPoint::origin(), Motion::identity()),
            |(position, prev_gap), (motion, target)| {
                *position = *position + *motion;
                let gap = *target - *position;
                let shift = gap - *prev_gap;
                *prev_gap = gap;
                Some(*motion + shift)
            },
        )
        .collect()
}

/// Per-frame warps that place every frame on the smoothed trajectory.
///
/// Frame `i` sits at `trajectory[i] - motions[i]` before warping; adding
/// `motions[i] + (smoothed[i] - trajectory[i])` moves it onto `smoothed[i]`.
/// Unlike [`rederive`], the gap is applied in full at every frame rather than
/// as a change from the previous one.
pub fn frame_warps(
    motions: &[Motion],
    trajectory: &[TrajectoryPoint],
    smoothed: &[TrajectoryPoint],
) -> Vec<Motion> {
    debug_assert_eq!(motions.len(), trajectory.len());
    debug_assert_eq!(motions.len(), smoothed.len());

    motions
        .iter()
        .zip(trajectory.iter().zip(smoothed))
        .map(|(motion, (raw, target))| *motion + (*target - *raw))
        .collect()
}

/// Run all three passes with the default windowed average.
pub fn stabilize(motions: &[Motion], radius: usize) -> StabilizedPath {
    stabilize_with(motions, radius, SmoothingMethod::Window)
}

/// Run all three passes with an explicit smoothing method.
pub fn stabilize_with(motions: &[Motion], radius: usize, method: SmoothingMethod) -> StabilizedPath {
    let trajectory = accumulate(motions);
    let smoothed = method.apply(&trajectory, radius);
    let corrected = rederive(motions, &smoothed);
    let warps = frame_warps(motions, &trajectory, &smoothed);

    StabilizedPath {
        trajectory,
        smoothed,
        corrected,
        warps,
    }
}

/// Corrected motions only.
pub fn correct_motions(motions: &[Motion], radius: usize) -> Vec<Motion> {
    stabilize(motions, radius).corrected
}

/// Reject sequences containing NaN or infinite components.
pub fn validate_motions(motions: &[Motion]) -> MediaResult<()> {
    match motions.iter().position(|m| !m.is_finite()) {
        Some(index) => Err(MediaError::InvalidMotion { index }),
        None => Ok(()),
    }
}
