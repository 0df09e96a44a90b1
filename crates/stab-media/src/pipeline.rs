//! Two-pass video stabilization.
//!
//! # Pipeline
//! 1. Analyze: decode every frame and estimate the motion of each consecutive pair
//! 2. Plan: fill failed estimates per [`GapPolicy`](stab_models::GapPolicy) and smooth the trajectory
//! 3. Render: rewind, warp every kept frame onto the smoothed trajectory and encode it
//!
//! The final frame has no outgoing motion and is not written.

use std::path::{Path, PathBuf};

use stab_models::{FrameEstimate, Motion, StabilizationReport, StabilizedPath};
use tokio::sync::watch;

use crate::config::StabilizeConfig;
use crate::error::{MediaError, MediaResult};
use crate::estimator::TrackingStats;
use crate::progress::{ProgressCallback, StabilizeProgress};
use crate::trajectory::{fill_gaps, stabilize_with, validate_motions, GapFill};

/// Smoothed corrections ready for rendering.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StabilizationPlan {
    /// Gap-free motions and the frame each applies to
    pub fill: GapFill,
    /// Trajectory passes over `fill.motions`
    pub path: StabilizedPath,
}

impl StabilizationPlan {
    /// Warp that places an input frame on the smoothed trajectory, `None` if
    /// the frame is not written.
    pub fn correction_for(&self, frame: usize) -> Option<Motion> {
        self.fill
            .frame_indices
            .binary_search(&frame)
            .ok()
            .map(|k| self.path.warps[k])
    }

    /// Last input frame that gets written.
    pub fn last_frame(&self) -> Option<usize> {
        self.fill.frame_indices.last().copied()
    }

    pub fn len(&self) -> usize {
        self.fill.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fill.is_empty()
    }

    /// Assemble the run report.
    pub fn into_report(
        self,
        config: &StabilizeConfig,
        frames_read: usize,
        frames_written: usize,
        stats: &TrackingStats,
    ) -> StabilizationReport {
        StabilizationReport {
            frames_read,
            frames_written,
            estimation_failures: stats.failures,
            average_tracked_points: stats.average_tracked(),
            smoothing_radius: config.smoothing_radius,
            gap_policy: config.gap_policy,
            frame_indices: self.fill.frame_indices,
            motions: self.fill.motions,
            path: self.path,
        }
    }
}

/// Turn per-pair estimates into per-frame corrections.
pub fn plan_stabilization(
    estimates: &[FrameEstimate],
    config: &StabilizeConfig,
) -> MediaResult<StabilizationPlan> {
    let fill = fill_gaps(estimates, config.gap_policy);
    if fill.is_empty() {
        return Err(MediaError::NoUsableMotion);
    }
    validate_motions(&fill.motions)?;

    let path = stabilize_with(&fill.motions, config.smoothing_radius, config.smoothing_method);
    Ok(StabilizationPlan { fill, path })
}

/// Runs the analyze and render passes over one video.
pub struct Stabilizer {
    config: StabilizeConfig,
    progress: Option<ProgressCallback>,
    cancel_rx: Option<watch::Receiver<bool>>,
}

impl Stabilizer {
    pub fn new(config: StabilizeConfig) -> Self {
        Self {
            config,
            progress: None,
            cancel_rx: None,
        }
    }

    /// Set progress callback.
    pub fn with_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(StabilizeProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Box::new(callback));
        self
    }

    /// Set cancellation signal.
    pub fn with_cancel(mut self, cancel_rx: watch::Receiver<bool>) -> Self {
        self.cancel_rx = Some(cancel_rx);
        self
    }

    pub fn config(&self) -> &StabilizeConfig {
        &self.config
    }

    /// Stabilize `input` into `output` on a tokio blocking thread.
    pub async fn run_async(self, input: PathBuf, output: PathBuf) -> MediaResult<StabilizationReport> {
        tokio::task::spawn_blocking(move || self.run(&input, &output))
            .await
            .map_err(|e| MediaError::internal(format!("stabilization task failed: {e}")))?
    }

    fn emit(&self, progress: StabilizeProgress) {
        if let Some(callback) = &self.progress {
            callback(progress);
        }
    }

    fn check_cancelled(&self) -> MediaResult<()> {
        if let Some(ref cancel_rx) = self.cancel_rx {
            if *cancel_rx.borrow() {
                return Err(MediaError::Cancelled);
            }
        }
        Ok(())
    }
}

#[cfg(not(feature = "opencv"))]
impl Stabilizer {
    /// Stabilize `input` into `output`. Blocks until both passes finish.
    pub fn run(&self, _input: &Path, _output: &Path) -> MediaResult<StabilizationReport> {
        self.config.validate()?;
        Err(MediaError::OpencvUnavailable)
    }
}

#[cfg(feature = "opencv")]
mod run {
    use std::path::Path;
    use std::time::Instant;

    use opencv::prelude::*;
    use stab_models::{FrameEstimate, StabilizationReport};
    use tracing::{debug, info, warn};

    use super::{plan_stabilization, StabilizationPlan, Stabilizer};
    use crate::error::{cv_err, MediaError, MediaResult};
    use crate::estimator::{to_grey, MotionEstimator, TrackingStats};
    use crate::export::write_transform_logs;
    use crate::metrics;
    use crate::progress::{Pass, StabilizeProgress};
    use crate::video::{usable_fps, VideoSink, VideoSource, FALLBACK_FPS};
    use crate::warp::FrameWarper;

    struct Analysis {
        estimates: Vec<FrameEstimate>,
        frames_read: usize,
        stats: TrackingStats,
    }

    impl Stabilizer {
        /// Stabilize `input` into `output`. Blocks until both passes finish.
        pub fn run(&self, input: &Path, output: &Path) -> MediaResult<StabilizationReport> {
            self.config.validate()?;
            let mut source = VideoSource::open(input)?;

            info!(
                input = %input.display(),
                output = %output.display(),
                radius = self.config.smoothing_radius,
                gap_policy = %self.config.gap_policy,
                "Stabilizing video"
            );

            let analysis = self.analyze(&mut source)?;
            let plan = plan_stabilization(&analysis.estimates, &self.config)?;
            info!(
                motions = plan.len(),
                substituted = plan.fill.substituted,
                dropped = plan.fill.dropped,
                "Trajectory smoothed"
            );

            source.rewind()?;
            let frames_written = self.render(&mut source, output, &plan)?;

            let report = plan.into_report(&self.config, analysis.frames_read, frames_written, &analysis.stats);
            if let Some(dir) = &self.config.export_dir {
                write_transform_logs(dir, &report)?;
            }

            info!(
                frames_read = report.frames_read,
                frames_written = report.frames_written,
                failures = report.estimation_failures,
                max_correction = report.max_correction(),
                "Stabilization complete"
            );
            Ok(report)
        }

        fn analyze(&self, source: &mut VideoSource) -> MediaResult<Analysis> {
            let started = Instant::now();
            let total_frames = source.frame_count();
            let mut estimator = MotionEstimator::from_config(&self.config);

            let first = source
                .next_frame()?
                .ok_or(MediaError::NotEnoughFrames { frames: 0 })?;
            let mut reference = to_grey(&first)?;
            let mut reference_index = 0usize;
            let mut frames_read = 1usize;
            let mut estimates = Vec::with_capacity(total_frames.saturating_sub(1) as usize);
            metrics::record_frame(Pass::Analyze);

            while let Some(frame) = source.next_frame()? {
                self.check_cancelled()?;
                let index = frames_read;
                frames_read += 1;

                let grey = to_grey(&frame)?;
                let (motion, tracked) = estimator.estimate(&reference, &grey)?;
                metrics::record_frame(Pass::Analyze);
                metrics::record_tracked_features(tracked);

                let estimate = match motion {
                    Some(motion) => {
                        debug!(
                            frame = index,
                            tracked,
                            average = estimator.stats().average_tracked(),
                            dx = motion.dx,
                            dy = motion.dy,
                            da = motion.da,
                            "Estimated motion"
                        );
                        FrameEstimate::found(reference_index, index, motion, tracked)
                    }
                    None => {
                        warn!(
                            frame = index,
                            reference = reference_index,
                            tracked,
                            policy = %self.config.gap_policy,
                            "No transform found"
                        );
                        metrics::record_estimation_failure();
                        FrameEstimate::missing(reference_index, index, tracked)
                    }
                };

                if estimate.is_found() || self.config.gap_policy.advances_on_failure() {
                    reference = grey;
                    reference_index = index;
                }
                estimates.push(estimate);

                self.emit(StabilizeProgress {
                    pass: Pass::Analyze,
                    frame: frames_read as u64,
                    total_frames,
                    tracked_points: tracked,
                    average_tracked_points: estimator.stats().average_tracked(),
                });
            }

            if frames_read < 2 {
                return Err(MediaError::NotEnoughFrames { frames: frames_read });
            }

            let elapsed = started.elapsed().as_secs_f64();
            metrics::record_pass_duration(Pass::Analyze, elapsed);
            info!(
                frames = frames_read,
                failures = estimator.stats().failures,
                average_tracked = estimator.stats().average_tracked(),
                elapsed_secs = elapsed,
                "Motion analysis complete"
            );

            Ok(Analysis {
                estimates,
                frames_read,
                stats: *estimator.stats(),
            })
        }

        fn render(&self, source: &mut VideoSource, output: &Path, plan: &StabilizationPlan) -> MediaResult<usize> {
            let started = Instant::now();
            let warper = FrameWarper::new(self.config.border_crop, self.config.side_by_side);
            let fps = self
                .config
                .output_fps
                .or_else(|| usable_fps(source.fps()))
                .unwrap_or_else(|| {
                    warn!(fallback = FALLBACK_FPS, "Source reports no frame rate");
                    FALLBACK_FPS
                });
            let total_frames = plan.len() as u64;
            let last_frame = plan.last_frame().unwrap_or(0);

            let mut sink: Option<VideoSink> = None;
            let mut index = 0usize;
            let mut written = 0u64;

            while let Some(frame) = source.next_frame()? {
                self.check_cancelled()?;
                if index > last_frame {
                    break;
                }

                if let Some(motion) = plan.correction_for(index) {
                    let out = warper.render(&frame, &motion)?;
                    if sink.is_none() {
                        let size = warper.output_size(frame.size().map_err(cv_err("frame size"))?);
                        sink = Some(VideoSink::create(output, self.config.fourcc_chars(), fps, size)?);
                    }
                    if let Some(sink) = sink.as_mut() {
                        sink.write(&out)?;
                    }
                    written += 1;
                    metrics::record_frame(Pass::Render);

                    self.emit(StabilizeProgress {
                        pass: Pass::Render,
                        frame: written,
                        total_frames,
                        ..Default::default()
                    });
                } else {
                    debug!(frame = index, "Frame dropped");
                }
                index += 1;
            }

            let frames_written = match sink {
                Some(sink) => sink.finish()?,
                None => return Err(MediaError::VideoWrite("no frames were rendered".to_string())),
            };

            let elapsed = started.elapsed().as_secs_f64();
            metrics::record_pass_duration(Pass::Render, elapsed);
            info!(
                frames = frames_written,
                fps,
                elapsed_secs = elapsed,
                output = %output.display(),
                "Render complete"
            );
            Ok(frames_written)
        }
    }
}

/// Stabilize a video file. Blocks until done.
pub fn stabilize_video<F>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &StabilizeConfig,
    progress: F,
) -> MediaResult<StabilizationReport>
where
    F: Fn(StabilizeProgress) + Send + Sync + 'static,
{
    Stabilizer::new(config.clone())
        .with_progress(progress)
        .run(input.as_ref(), output.as_ref())
}

/// Stabilize a video file on tokio's blocking pool.
pub async fn stabilize_video_async<F>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    config: &StabilizeConfig,
    progress: F,
) -> MediaResult<StabilizationReport>
where
    F: Fn(StabilizeProgress) + Send + Sync + 'static,
{
    Stabilizer::new(config.clone())
        .with_progress(progress)
        .run_async(input.as_ref().to_path_buf(), output.as_ref().to_path_buf())
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use stab_models::GapPolicy;

    fn estimates() -> Vec<FrameEstimate> {
        vec![
            FrameEstimate::found(0, 1, Motion::new(1.0, 0.0, 0.0), 120),
            FrameEstimate::missing(1, 2, 3),
            FrameEstimate::found(1, 3, Motion::new(2.0, 0.0, 0.0), 110),
            FrameEstimate::found(3, 4, Motion::new(1.0, 0.0, 0.0), 130),
        ]
    }

    #[test]
    fn test_plan_skip_drops_failed_frame() {
        let config = StabilizeConfig {
            smoothing_radius: 1,
            gap_policy: GapPolicy::Skip,
            ..Default::default()
        };
        let plan = plan_stabilization(&estimates(), &config).unwrap();

        assert_eq!(plan.len(), 3);
        assert_eq!(plan.last_frame(), Some(3));
        assert!(plan.correction_for(0).is_some());
        assert!(plan.correction_for(1).is_some());
        assert!(plan.correction_for(2).is_none());
        assert!(plan.correction_for(3).is_some());
        // Final input frame has no outgoing motion.
        assert!(plan.correction_for(4).is_none());
    }

    #[test]
    fn test_plan_reuse_last_keeps_every_frame() {
        let config = StabilizeConfig {
            smoothing_radius: 1,
            ..Default::default()
        };
        // The reference frame advances past failures under this policy.
        let estimates = vec![
            FrameEstimate::found(0, 1, Motion::new(1.0, 0.0, 0.0), 120),
            FrameEstimate::missing(1, 2, 3),
            FrameEstimate::found(2, 3, Motion::new(2.0, 0.0, 0.0), 110),
        ];
        let plan = plan_stabilization(&estimates, &config).unwrap();

        assert_eq!(plan.fill.frame_indices, vec![0, 1, 2]);
        assert_eq!(plan.fill.motions[1], Motion::new(1.0, 0.0, 0.0));
        assert_eq!(plan.fill.substituted, 1);
        assert!(plan.correction_for(2).is_some());
        assert_eq!(plan.last_frame(), Some(2));
    }

    #[test]
    fn test_plan_corrections_follow_smoothed_path() {
        let config = StabilizeConfig {
            smoothing_radius: 2,
            gap_policy: GapPolicy::Identity,
            ..Default::default()
        };
        let plan = plan_stabilization(&estimates(), &config).unwrap();

        let mut x = 0.0;
        for (corrected, smoothed) in plan.path.corrected.iter().zip(&plan.path.smoothed) {
            x += corrected.dx;
            assert!((x - smoothed.x).abs() < 1e-9);
        }
    }

    #[test]
    fn test_plan_without_usable_motion() {
        let config = StabilizeConfig {
            gap_policy: GapPolicy::Skip,
            ..Default::default()
        };
        let all_failed = vec![FrameEstimate::missing(0, 1, 0), FrameEstimate::missing(0, 2, 0)];
        let err = plan_stabilization(&all_failed, &config).unwrap_err();
        assert!(matches!(err, MediaError::NoUsableMotion));

        let err = plan_stabilization(&[], &config).unwrap_err();
        assert!(matches!(err, MediaError::NoUsableMotion));
    }

    #[test]
    fn test_plan_rejects_non_finite_motion() {
        let bad = vec![
            FrameEstimate::found(0, 1, Motion::new(1.0, 0.0, 0.0), 50),
            FrameEstimate::found(1, 2, Motion::new(f64::INFINITY, 0.0, 0.0), 50),
        ];
        let err = plan_stabilization(&bad, &StabilizeConfig::default()).unwrap_err();
        assert!(matches!(err, MediaError::InvalidMotion { index: 1 }));
    }

    #[test]
    fn test_into_report() {
        let config = StabilizeConfig {
            smoothing_radius: 1,
            gap_policy: GapPolicy::Skip,
            ..Default::default()
        };
        let plan = plan_stabilization(&estimates(), &config).unwrap();
        let mut stats = TrackingStats::default();
        for e in estimates() {
            stats.record(e.tracked_points, e.is_found());
        }

        let report = plan.into_report(&config, 5, 3, &stats);
        assert_eq!(report.frames_read, 5);
        assert_eq!(report.frames_written, 3);
        assert_eq!(report.estimation_failures, 1);
        assert_eq!(report.gap_policy, GapPolicy::Skip);
        assert_eq!(report.frame_indices, vec![0, 1, 3]);
        assert_eq!(report.path.len(), 3);
    }

    #[test]
    fn test_cancelled_before_start() {
        let (tx, rx) = watch::channel(false);
        let stabilizer = Stabilizer::new(StabilizeConfig::default()).with_cancel(rx);
        assert!(stabilizer.check_cancelled().is_ok());

        tx.send(true).unwrap();
        assert!(matches!(stabilizer.check_cancelled(), Err(MediaError::Cancelled)));
    }

    #[test]
    fn test_invalid_config_rejected_before_io() {
        let config = StabilizeConfig {
            max_corners: 0,
            ..Default::default()
        };
        let err = stabilize_video("missing.mp4", "out.mp4", &config, |_| {}).unwrap_err();
        assert!(matches!(err, MediaError::InvalidConfig(_)));
    }

    #[cfg(feature = "opencv")]
    #[tokio::test]
    async fn test_missing_input_async() {
        let dir = tempfile::tempdir().unwrap();
        let err = stabilize_video_async(
            dir.path().join("missing.mp4"),
            dir.path().join("out.mp4"),
            &StabilizeConfig::default(),
            |_| {},
        )
        .await
        .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(_)));
    }

    #[cfg(not(feature = "opencv"))]
    #[tokio::test]
    async fn test_unavailable_without_opencv() {
        let err = stabilize_video_async("in.mp4", "out.mp4", &StabilizeConfig::default(), |_| {})
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::OpencvUnavailable));
    }

    #[test]
    fn test_run_async_from_sync_context() {
        let stabilizer = Stabilizer::new(StabilizeConfig::default());
        let err = tokio_test::block_on(
            stabilizer.run_async(PathBuf::from("no/such/input.mp4"), PathBuf::from("out.mp4")),
        )
        .unwrap_err();
        if cfg!(feature = "opencv") {
            assert!(matches!(err, MediaError::FileNotFound(_)));
        } else {
            assert!(matches!(err, MediaError::OpencvUnavailable));
        }
    }
}
