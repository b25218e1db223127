//! Fundamental geometric types.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RouteError};

/// 3D vector in world space (double precision).
pub type Vec3 = glam::DVec3;

/// Anything that can be located by a single world-space point.
pub trait Positioned {
    fn position(&self) -> Vec3;
}

impl Positioned for Vec3 {
    fn position(&self) -> Vec3 {
        *self
    }
}

/// Axis-aligned world box the planner samples from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    /// Build a box, rejecting any axis where `min > max`.
    pub fn new(min: Vec3, max: Vec3) -> Result<Self> {
        let bounds = Self { min, max };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        if (0..3).any(|axis| self.min[axis] > self.max[axis]) {
            return Err(RouteError::InvalidBounds {
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }

    /// True if `point` lies inside the box (faces inclusive).
    pub fn contains(&self, point: Vec3) -> bool {
        (0..3).all(|axis| point[axis] >= self.min[axis] && point[axis] <= self.max[axis])
    }

    /// Edge lengths of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }
}
