//! Frame-to-frame motion and cumulative trajectory points.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// Rigid motion between two consecutive frames.
///
/// Translation is in pixels, rotation in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Motion {
    /// Horizontal translation
    pub dx: f64,
    /// Vertical translation
    pub dy: f64,
    /// Rotation angle
    pub da: f64,
}

impl Motion {
    /// Create a new motion.
    pub const fn new(dx: f64, dy: f64, da: f64) -> Self {
        Self { dx, dy, da }
    }

    /// Zero motion (no translation, no rotation).
    pub const fn identity() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Check that every component is a finite number.
    pub fn is_finite(&self) -> bool {
        self.dx.is_finite() && self.dy.is_finite() && self.da.is_finite()
    }

    /// Largest absolute component, useful for comparing correction strength.
    pub fn max_abs(&self) -> f64 {
        self.dx.abs().max(self.dy.abs()).max(self.da.abs())
    }
}

impl Add for Motion {
    type Output = Motion;

    fn add(self, rhs: Motion) -> Motion {
        Motion::new(self.dx + rhs.dx, self.dy + rhs.dy, self.da + rhs.da)
    }
}

impl Sub for Motion {
    type Output = Motion;

    fn sub(self, rhs: Motion) -> Motion {
        Motion::new(self.dx - rhs.dx, self.dy - rhs.dy, self.da - rhs.da)
    }
}

/// Cumulative camera position and orientation at one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrajectoryPoint {
    /// Accumulated horizontal position
    pub x: f64,
    /// Accumulated vertical position
    pub y: f64,
    /// Accumulated angle
    pub a: f64,
}

impl TrajectoryPoint {
    /// Create a new trajectory point.
    pub const fn new(x: f64, y: f64, a: f64) -> Self {
        Self { x, y, a }
    }

    /// The starting point of every trajectory.
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Componentwise mean of a window sum over `count` points.
    pub fn mean_of(sum: TrajectoryPoint, count: usize) -> Self {
        let n = count as f64;
        Self::new(sum.x / n, sum.y / n, sum.a / n)
    }
}

/// Advancing a trajectory point by one motion step.
impl Add<Motion> for TrajectoryPoint {
    type Output = TrajectoryPoint;

    fn add(self, rhs: Motion) -> TrajectoryPoint {
        TrajectoryPoint::new(self.x + rhs.dx, self.y + rhs.dy, self.a + rhs.da)
    }
}

/// Componentwise sum of two points, used by window accumulators.
impl Add for TrajectoryPoint {
    type Output = TrajectoryPoint;

    fn add(self, rhs: TrajectoryPoint) -> TrajectoryPoint {
        TrajectoryPoint::new(self.x + rhs.x, self.y + rhs.y, self.a + rhs.a)
    }
}

/// The offset between two points, expressed as a motion.
impl Sub for TrajectoryPoint {
    type Output = Motion;

    fn sub(self, rhs: TrajectoryPoint) -> Motion {
        Motion::new(self.x - rhs.x, self.y - rhs.y, self.a - rhs.a)
    }
}
