//! Frame-to-frame motion estimation.
//!
//! Shi-Tomasi corners on the reference frame are followed into the next
//! frame with pyramidal Lucas-Kanade optical flow, and a rotation plus
//! translation (plus uniform scale, which is discarded) is fitted to the
//! surviving pairs with RANSAC.

/// Running statistics about how many features survive optical flow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrackingStats {
    /// Frame pairs analysed
    pub pairs: usize,
    /// Pairs for which no transform was found
    pub failures: usize,
    /// Features tracked in the latest pair
    pub last_tracked: usize,
    total_tracked: usize,
}

impl TrackingStats {
    /// Record the outcome of one pair.
    pub fn record(&mut self, tracked: usize, found: bool) {
        self.pairs += 1;
        self.last_tracked = tracked;
        self.total_tracked += tracked;
        if !found {
            self.failures += 1;
        }
    }

    /// Mean tracked features per pair.
    pub fn average_tracked(&self) -> f64 {
        if self.pairs == 0 {
            return 0.0;
        }
        self.total_tracked as f64 / self.pairs as f64
    }
}

#[cfg(feature = "opencv")]
pub use cv::{to_grey, MotionEstimator};

#[cfg(feature = "opencv")]
mod cv {
    use opencv::{
        calib3d,
        core::{self, Mat, Point2f, Size, TermCriteria, Vector},
        imgproc,
        prelude::*,
        video,
    };
    use stab_models::{Motion, RigidTransform};
    use tracing::trace;

    use super::TrackingStats;
    use crate::config::StabilizeConfig;
    use crate::error::{cv_err, MediaResult};

    /// Lucas-Kanade search window.
    const FLOW_WINDOW: i32 = 21;
    /// Pyramid levels above the base image.
    const FLOW_MAX_LEVEL: i32 = 3;
    /// RANSAC reprojection threshold in pixels.
    const RANSAC_THRESHOLD: f64 = 3.0;

    /// Convert a BGR frame to single-channel grey.
    pub fn to_grey(frame: &Mat) -> MediaResult<Mat> {
        if frame.channels() == 1 {
            return frame.try_clone().map_err(cv_err("grey clone"));
        }
        let mut grey = Mat::default();
        imgproc::cvt_color_def(frame, &mut grey, imgproc::COLOR_BGR2GRAY)
            .map_err(cv_err("bgr2gray"))?;
        Ok(grey)
    }

    /// Estimates the rigid motion between consecutive grey frames.
    pub struct MotionEstimator {
        max_corners: i32,
        quality_level: f64,
        min_distance: f64,
        min_tracked_points: usize,
        stats: TrackingStats,
    }

    impl MotionEstimator {
        pub fn from_config(config: &StabilizeConfig) -> Self {
            Self {
                max_corners: config.max_corners,
                quality_level: config.quality_level,
                min_distance: config.min_distance,
                min_tracked_points: config.min_tracked_points.max(2),
                stats: TrackingStats::default(),
            }
        }

        pub fn stats(&self) -> &TrackingStats {
            &self.stats
        }

        /// Estimate the motion from `prev` to `cur`.
        ///
        /// Returns the motion, or `None` when too few features were tracked or
        /// no transform could be fitted, together with the tracked feature count.
        pub fn estimate(&mut self, prev: &Mat, cur: &Mat) -> MediaResult<(Option<Motion>, usize)> {
            let (from, to) = self.track(prev, cur)?;
            let tracked = from.len();

            let motion = if tracked < self.min_tracked_points {
                None
            } else {
                self.fit(&from, &to)?
            };

            self.stats.record(tracked, motion.is_some());
            Ok((motion, tracked))
        }

        /// Corners in `prev` and where optical flow found them in `cur`.
        fn track(&self, prev: &Mat, cur: &Mat) -> MediaResult<(Vector<Point2f>, Vector<Point2f>)> {
            let mut corners = Vector::<Point2f>::new();
            imgproc::good_features_to_track(
                prev,
                &mut corners,
                self.max_corners,
                self.quality_level,
                self.min_distance,
                &core::no_array(),
                3,
                false,
                0.04,
            )
            .map_err(cv_err("good_features_to_track"))?;

            if corners.is_empty() {
                return Ok((Vector::new(), Vector::new()));
            }

            let mut moved = Vector::<Point2f>::new();
            let mut status = Vector::<u8>::new();
            let mut err = Vector::<f32>::new();
            let criteria = TermCriteria {
                typ: core::TermCriteria_COUNT + core::TermCriteria_EPS,
                max_count: 30,
                epsilon: 0.01,
            };
            video::calc_optical_flow_pyr_lk(
                prev,
                cur,
                &corners,
                &mut moved,
                &mut status,
                &mut err,
                Size::new(FLOW_WINDOW, FLOW_WINDOW),
                FLOW_MAX_LEVEL,
                criteria,
                0,
                1e-4,
            )
            .map_err(cv_err("calc_optical_flow_pyr_lk"))?;

            let mut from = Vector::<Point2f>::with_capacity(status.len());
            let mut to = Vector::<Point2f>::with_capacity(status.len());
            for (i, ok) in status.iter().enumerate() {
                if ok == 0 {
                    continue;
                }
                from.push(corners.get(i).map_err(cv_err("corner index"))?);
                to.push(moved.get(i).map_err(cv_err("flow index"))?);
            }

            trace!(corners = corners.len(), tracked = from.len(), "Optical flow");
            Ok((from, to))
        }

        /// Fit a partial affine transform and decompose it.
        fn fit(&self, from: &Vector<Point2f>, to: &Vector<Point2f>) -> MediaResult<Option<Motion>> {
            let mut inliers = Mat::default();
            let transform = calib3d::estimate_affine_partial_2d(
                from,
                to,
                &mut inliers,
                calib3d::RANSAC,
                RANSAC_THRESHOLD,
                2000,
                0.99,
                10,
            )
            .map_err(cv_err("estimate_affine_partial_2d"))?;

            if transform.empty() {
                return Ok(None);
            }

            let mut m = [[0.0f64; 3]; 2];
            for (r, row) in m.iter_mut().enumerate() {
                for (c, value) in row.iter_mut().enumerate() {
                    *value = *transform
                        .at_2d::<f64>(r as i32, c as i32)
                        .map_err(cv_err("transform element"))?;
                }
            }

            let motion = RigidTransform { m }.to_motion();
            Ok(motion.is_finite().then_some(motion))
        }
    }
}
