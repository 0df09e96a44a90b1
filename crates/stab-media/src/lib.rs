#![deny(unreachable_patterns)]
//! Video stabilization.
//!
//! This crate provides:
//! - Trajectory accumulation, windowed smoothing and motion re-derivation
//! - Gap filling for frame pairs without a usable transform
//! - Feature tracking and rigid motion estimation (OpenCV)
//! - Frame warping with optional border crop and side-by-side output (OpenCV)
//! - A two-pass pipeline with progress, cancellation and transform-log export
//!
//! Everything except the OpenCV-backed pieces builds with
//! `default-features = false`.

pub mod config;
pub mod error;
pub mod estimator;
pub mod export;
pub mod metrics;
pub mod pipeline;
pub mod progress;
pub mod trajectory;
pub mod video;
pub mod warp;

pub use config::StabilizeConfig;
pub use error::{MediaError, MediaResult};
pub use estimator::TrackingStats;
pub use export::write_transform_logs;
pub use pipeline::{plan_stabilization, stabilize_video, stabilize_video_async, StabilizationPlan, Stabilizer};
pub use progress::{Pass, ProgressCallback, StabilizeProgress};
pub use trajectory::{correct_motions, fill_gaps, frame_warps, stabilize, stabilize_with, GapFill, SmoothingMethod};
pub use warp::CropRect;

#[cfg(feature = "opencv")]
pub use estimator::MotionEstimator;
#[cfg(feature = "opencv")]
pub use video::{VideoSink, VideoSource};
#[cfg(feature = "opencv")]
pub use warp::FrameWarper;

pub use stab_models::{FrameEstimate, GapPolicy, Motion, StabilizationReport, StabilizedPath, TrajectoryPoint};
