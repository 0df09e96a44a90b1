//! Stabilization metrics.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.

use metrics::{counter, histogram};

use crate::progress::Pass;

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_PROCESSED_TOTAL: &str = "videostab_frames_processed_total";
    pub const ESTIMATION_FAILURES_TOTAL: &str = "videostab_estimation_failures_total";
    pub const TRACKED_FEATURES: &str = "videostab_tracked_features";
    pub const PASS_DURATION_SECONDS: &str = "videostab_pass_duration_seconds";
}

/// Record one frame handled by a pass.
pub fn record_frame(pass: Pass) {
    let labels = [("pass", pass.to_string())];
    counter!(names::FRAMES_PROCESSED_TOTAL, &labels).increment(1);
}

/// Record a frame pair with no usable transform.
pub fn record_estimation_failure() {
    counter!(names::ESTIMATION_FAILURES_TOTAL).increment(1);
}

/// Record how many features survived optical flow for one pair.
pub fn record_tracked_features(count: usize) {
    histogram!(names::TRACKED_FEATURES).record(count as f64);
}

/// Record the wall time of a complete pass.
pub fn record_pass_duration(pass: Pass, duration_secs: f64) {
    let labels = [("pass", pass.to_string())];
    histogram!(names::PASS_DURATION_SECONDS, &labels).record(duration_secs);
}
