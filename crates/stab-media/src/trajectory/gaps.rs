//! Turning per-pair estimates into a gap-free motion sequence.

use stab_models::{FrameEstimate, GapPolicy, Motion};

/// Gap-free motions plus the input frame each one is applied to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GapFill {
    /// One motion per kept frame
    pub motions: Vec<Motion>,
    /// Input frame index for each motion (the pair's reference frame)
    pub frame_indices: Vec<usize>,
    /// Estimates that were replaced by the policy
    pub substituted: usize,
    /// Estimates that were dropped by the policy
    pub dropped: usize,
}

impl GapFill {
    pub fn len(&self) -> usize {
        self.motions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motions.is_empty()
    }
}

/// Apply `policy` to every failed estimate.
///
/// With [`GapPolicy::Skip`] failed pairs disappear entirely; the estimator is
/// expected to have kept the reference frame, so the next estimate starts from
/// the last kept frame.
pub fn fill_gaps(estimates: &[FrameEstimate], policy: GapPolicy) -> GapFill {
    let mut fill = GapFill {
        motions: Vec::with_capacity(estimates.len()),
        frame_indices: Vec::with_capacity(estimates.len()),
        ..Default::default()
    };
    let mut last_good: Option<Motion> = None;

    for estimate in estimates {
        let motion = match (estimate.motion, policy) {
            (Some(motion), _) => {
                last_good = Some(motion);
                motion
            }
            (None, GapPolicy::ReuseLast) => {
                fill.substituted += 1;
                last_good.unwrap_or_else(Motion::identity)
            }
            (None, GapPolicy::Identity) => {
                fill.substituted += 1;
                Motion::identity()
            }
            (None, GapPolicy::Skip) => {
                fill.dropped += 1;
                continue;
            }
        };
        fill.motions.push(motion);
        fill.frame_indices.push(estimate.from_frame);
    }

    fill
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimates() -> Vec<FrameEstimate> {
        vec![
            FrameEstimate::missing(0, 1, 2),
            FrameEstimate::found(1, 2, Motion::new(1.0, 2.0, 0.1), 150),
            FrameEstimate::missing(2, 3, 4),
            FrameEstimate::found(3, 4, Motion::new(-1.0, 0.0, 0.0), 140),
        ]
    }

    #[test]
    fn test_reuse_last() {
        let fill = fill_gaps(&estimates(), GapPolicy::ReuseLast);
        assert_eq!(
            fill.motions,
            vec![
                Motion::identity(),
                Motion::new(1.0, 2.0, 0.1),
                Motion::new(1.0, 2.0, 0.1),
                Motion::new(-1.0, 0.0, 0.0),
            ]
        );
        assert_eq!(fill.frame_indices, vec![0, 1, 2, 3]);
        assert_eq!(fill.substituted, 2);
        assert_eq!(fill.dropped, 0);
    }

    #[test]
    fn test_identity() {
        let fill = fill_gaps(&estimates(), GapPolicy::Identity);
        assert_eq!(fill.motions[2], Motion::identity());
        assert_eq!(fill.len(), 4);
    }

    #[test]
    fn test_skip_keeps_reference_frames() {
        // Reference frame 1 is held across the failed 1 -> 2 pair.
        let estimates = vec![
            FrameEstimate::found(0, 1, Motion::new(1.0, 0.0, 0.0), 100),
            FrameEstimate::missing(1, 2, 0),
            FrameEstimate::found(1, 3, Motion::new(2.0, 0.0, 0.0), 100),
            FrameEstimate::found(3, 4, Motion::new(3.0, 0.0, 0.0), 100),
        ];
        let fill = fill_gaps(&estimates, GapPolicy::Skip);
        assert_eq!(fill.frame_indices, vec![0, 1, 3]);
        assert_eq!(fill.motions.len(), 3);
        assert_eq!(fill.dropped, 1);
        assert_eq!(fill.substituted, 0);
    }

    #[test]
    fn test_all_missing_with_skip() {
        let estimates = vec![FrameEstimate::missing(0, 1, 0), FrameEstimate::missing(0, 2, 0)];
        let fill = fill_gaps(&estimates, GapPolicy::Skip);
        assert!(fill.is_empty());
        assert_eq!(fill.dropped, 2);
    }

    #[test]
    fn test_empty() {
        assert!(fill_gaps(&[], GapPolicy::ReuseLast).is_empty());
    }
}
