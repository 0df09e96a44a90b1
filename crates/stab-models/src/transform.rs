//! 2x3 rigid affine transforms.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::motion::Motion;

/// Row-major 2x3 affine matrix restricted to rotation plus translation.
///
/// ```text
/// [ cos(a)  -sin(a)  dx ]
/// [ sin(a)   cos(a)  dy ]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RigidTransform {
    pub m: [[f64; 3]; 2],
}

impl RigidTransform {
    /// The identity transform.
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        }
    }

    /// Build the matrix a frame warper applies for one motion.
    pub fn from_motion(motion: &Motion) -> Self {
        let (sin, cos) = motion.da.sin_cos();
        Self {
            m: [[cos, -sin, motion.dx], [sin, cos, motion.dy]],
        }
    }

    /// Decompose an estimated affine matrix into a rigid motion.
    ///
    /// Any scale or shear present in the matrix is discarded.
    pub fn to_motion(&self) -> Motion {
        Motion::new(self.m[0][2], self.m[1][2], self.m[1][0].atan2(self.m[0][0]))
    }

    /// Map a point through the transform.
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m[0][0] * x + self.m[0][1] * y + self.m[0][2],
            self.m[1][0] * x + self.m[1][1] * y + self.m[1][2],
        )
    }

    /// Matrix entries in row-major order.
    pub fn to_row_major(&self) -> [f64; 6] {
        [
            self.m[0][0], self.m[0][1], self.m[0][2],
            self.m[1][0], self.m[1][1], self.m[1][2],
        ]
    }
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<Motion> for RigidTransform {
    fn from(motion: Motion) -> Self {
        Self::from_motion(&motion)
    }
}
