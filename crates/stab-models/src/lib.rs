//! Shared data models for the videostab stabilizer.
//!
//! This crate provides Serde-serializable types for:
//! - Frame-to-frame rigid motion and cumulative camera trajectories
//! - 2x3 rigid affine transforms built from a motion
//! - Per-pair motion estimates and the gap policy applied to failed ones
//! - The run report written after a stabilization pass

pub mod estimate;
pub mod motion;
pub mod report;
pub mod transform;

pub use estimate::{FrameEstimate, GapPolicy, GapPolicyParseError};
pub use motion::{Motion, TrajectoryPoint};
pub use report::{StabilizationReport, StabilizedPath};
pub use transform::RigidTransform;
