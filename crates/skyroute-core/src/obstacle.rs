//! Spherical obstacles with optional time-parameterised motion.
//!
//! Motion is a pure function of elapsed time, so an obstacle's center never
//! depends on update history. A deep copy taken at any moment is safe to
//! plan against on another thread.

use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::error::RouteError;
use crate::types::{Positioned, Vec3};

/// Plane normal for circular orbits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Orthonormal basis `(u, v)` of the orbit plane. `theta = 0` lies on `u`.
    fn plane_basis(self) -> (Vec3, Vec3) {
        match self {
            Axis::X => (Vec3::Y, Vec3::Z),
            Axis::Y => (Vec3::Z, Vec3::X),
            Axis::Z => (Vec3::X, Vec3::Y),
        }
    }
}

/// What a linear mover does when it reaches the end of its polyline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    /// Reverse direction and travel back along the polyline.
    #[default]
    Bounce,
    /// Jump onto the closing leg from the last point back to the first.
    Cycle,
}

fn default_speed() -> f64 {
    1.0
}

/// Closed set of motion kinds, evaluated by [`Motion::position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Motion {
    /// Constant-speed travel along a polyline (`speed` in units/s).
    Linear {
        points: Vec<Vec3>,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default, rename = "loop")]
        loop_mode: LoopMode,
    },
    /// Orbit around `orbit_center` in the plane normal to `axis` (`speed` in rad/s).
    Circular {
        orbit_center: Vec3,
        orbit_radius: f64,
        axis: Axis,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default)]
        phase: f64,
    },
}

impl Motion {
    /// Center position at elapsed time `t` (seconds).
    pub fn position(&self, t: f64) -> Vec3 {
        match self {
            Motion::Linear {
                points,
                speed,
                loop_mode,
            } => polyline_position(points, *speed * t, *loop_mode),
            Motion::Circular {
                orbit_center,
                orbit_radius,
                axis,
                speed,
                phase,
            } => {
                let theta = (phase + speed * t).rem_euclid(TAU);
                let (u, v) = axis.plane_basis();
                *orbit_center + *orbit_radius * (theta.cos() * u + theta.sin() * v)
            }
        }
    }

    fn validate(&self) -> Result<(), RouteError> {
        match self {
            Motion::Linear { points, speed, .. } => {
                if points.is_empty() {
                    return Err(RouteError::InvalidParameter {
                        name: "linear motion point count",
                        value: 0.0,
                    });
                }
                check_finite("linear motion speed", *speed)
            }
            Motion::Circular {
                orbit_radius,
                speed,
                phase,
                ..
            } => {
                if orbit_radius.is_nan() || *orbit_radius < 0.0 {
                    return Err(RouteError::InvalidParameter {
                        name: "orbit radius",
                        value: *orbit_radius,
                    });
                }
                check_finite("circular motion speed", *speed)?;
                check_finite("circular motion phase", *phase)
            }
        }
    }
}

fn check_finite(name: &'static str, value: f64) -> Result<(), RouteError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(RouteError::InvalidParameter { name, value })
    }
}

/// Point at arc length `travel` along the polyline, wrapped per `loop_mode`.
fn polyline_position(points: &[Vec3], travel: f64, loop_mode: LoopMode) -> Vec3 {
    let Some(&first) = points.first() else {
        return Vec3::ZERO;
    };
    let last = points[points.len() - 1];
    let closing = (loop_mode == LoopMode::Cycle && points.len() > 1).then_some((last, first));
    let legs = || {
        points
            .windows(2)
            .map(|pair| (pair[0], pair[1]))
            .chain(closing)
    };

    let total: f64 = legs().map(|(a, b)| a.distance(b)).sum();
    if total <= f64::EPSILON {
        return first;
    }

    let mut remaining = match loop_mode {
        LoopMode::Bounce => {
            let d = travel.rem_euclid(2.0 * total);
            if d > total {
                2.0 * total - d
            } else {
                d
            }
        }
        LoopMode::Cycle => travel.rem_euclid(total),
    };

    let mut end = first;
    for (a, b) in legs() {
        let len = a.distance(b);
        if remaining <= len && len > 0.0 {
            return a + (b - a) * (remaining / len);
        }
        remaining -= len;
        end = b;
    }
    end
}

/// Sphere obstacle. `radius_sq` is cached for point tests.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ObstacleDef")]
pub struct Obstacle {
    pub center: Vec3,
    pub radius: f64,
    radius_sq: f64,
    pub motion: Option<Motion>,
}

/// On-disk obstacle layout, validated into an [`Obstacle`].
#[derive(Deserialize)]
struct ObstacleDef {
    center: Vec3,
    radius: f64,
    #[serde(default)]
    motion: Option<Motion>,
}

impl TryFrom<ObstacleDef> for Obstacle {
    type Error = RouteError;

    fn try_from(def: ObstacleDef) -> Result<Self, Self::Error> {
        if def.radius.is_nan() || def.radius < 0.0 {
            return Err(RouteError::InvalidParameter {
                name: "obstacle radius",
                value: def.radius,
            });
        }
        match def.motion {
            Some(motion) => {
                motion.validate()?;
                Ok(Obstacle::moving(def.radius, motion))
            }
            None => Ok(Obstacle::new(def.center, def.radius)),
        }
    }
}

impl Obstacle {
    /// Static sphere. `radius` must be non-negative.
    pub fn new(center: Vec3, radius: f64) -> Self {
        debug_assert!(radius >= 0.0, "obstacle radius must be non-negative");
        Self {
            center,
            radius,
            radius_sq: radius * radius,
            motion: None,
        }
    }

    /// Moving sphere, placed at its `t = 0` position.
    pub fn moving(radius: f64, motion: Motion) -> Self {
        let mut obstacle = Self::new(motion.position(0.0), radius);
        obstacle.motion = Some(motion);
        obstacle
    }

    pub fn radius_sq(&self) -> f64 {
        self.radius_sq
    }

    pub fn is_moving(&self) -> bool {
        self.motion.is_some()
    }

    /// Recompute the center for elapsed time `t`. Static obstacles ignore this.
    pub fn update(&mut self, t: f64) {
        if let Some(motion) = &self.motion {
            self.center = motion.position(t);
        }
    }

    /// True if `point` is inside or on the sphere.
    pub fn intersects_point(&self, point: Vec3) -> bool {
        self.center.distance_squared(point) <= self.radius_sq
    }

    /// Motionless copy of the current sphere.
    pub fn snapshot(&self) -> Obstacle {
        Obstacle::new(self.center, self.radius)
    }
}

impl Positioned for Obstacle {
    fn position(&self) -> Vec3 {
        self.center
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3) {
        assert!(a.distance(b) < 1e-9, "expected {b}, got {a}");
    }

    #[test]
    fn test_intersects_point_boundary_inclusive() {
        let obstacle = Obstacle::new(Vec3::ZERO, 2.0);
        assert!(obstacle.intersects_point(Vec3::new(2.0, 0.0, 0.0)));
        assert!(obstacle.intersects_point(Vec3::new(1.0, 1.0, 1.0)));
        assert!(!obstacle.intersects_point(Vec3::new(2.0, 0.1, 0.0)));
    }

    #[test]
    fn test_linear_bounce_reverses_at_end() {
        let motion = Motion::Linear {
            points: vec![Vec3::ZERO, Vec3::new(4.0, 0.0, 0.0)],
            speed: 1.0,
            loop_mode: LoopMode::Bounce,
        };
        assert_close(motion.position(0.0), Vec3::ZERO);
        assert_close(motion.position(3.0), Vec3::new(3.0, 0.0, 0.0));
        assert_close(motion.position(4.0), Vec3::new(4.0, 0.0, 0.0));
        assert_close(motion.position(5.0), Vec3::new(3.0, 0.0, 0.0));
        assert_close(motion.position(8.0), Vec3::ZERO);
    }

    #[test]
    fn test_linear_cycle_uses_closing_leg() {
        // Triangle with legs 3, 4, 5.
        let motion = Motion::Linear {
            points: vec![Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(3.0, 4.0, 0.0)],
            speed: 1.0,
            loop_mode: LoopMode::Cycle,
        };
        assert_close(motion.position(5.0), Vec3::new(3.0, 2.0, 0.0));
        // Halfway down the 5-long closing leg.
        assert_close(motion.position(9.5), Vec3::new(1.5, 2.0, 0.0));
        assert_close(motion.position(12.0), Vec3::ZERO);
    }

    #[test]
    fn test_linear_single_point_is_parked() {
        let motion = Motion::Linear {
            points: vec![Vec3::new(1.0, 2.0, 3.0)],
            speed: 5.0,
            loop_mode: LoopMode::Cycle,
        };
        assert_close(motion.position(17.0), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_circular_orbit_plane() {
        let motion = Motion::Circular {
            orbit_center: Vec3::new(1.0, 1.0, 1.0),
            orbit_radius: 2.0,
            axis: Axis::Z,
            speed: std::f64::consts::FRAC_PI_2,
            phase: 0.0,
        };
        assert_close(motion.position(0.0), Vec3::new(3.0, 1.0, 1.0));
        assert_close(motion.position(1.0), Vec3::new(1.0, 3.0, 1.0));
        assert_close(motion.position(2.0), Vec3::new(-1.0, 1.0, 1.0));
    }

    #[test]
    fn test_update_is_pure_function_of_time() {
        let mut a = Obstacle::moving(
            1.0,
            Motion::Circular {
                orbit_center: Vec3::ZERO,
                orbit_radius: 3.0,
                axis: Axis::X,
                speed: 0.7,
                phase: 0.3,
            },
        );
        let mut b = a.clone();

        a.update(1.0);
        a.update(9.0);
        a.update(2.5);
        b.update(2.5);

        assert_close(a.center, b.center);
    }

    #[test]
    fn test_snapshot_drops_motion() {
        let mut obstacle = Obstacle::moving(
            0.5,
            Motion::Linear {
                points: vec![Vec3::ZERO, Vec3::X * 10.0],
                speed: 2.0,
                loop_mode: LoopMode::Bounce,
            },
        );
        obstacle.update(1.0);

        let mut snap = obstacle.snapshot();
        snap.update(3.0);

        assert!(!snap.is_moving());
        assert_close(snap.center, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(snap.radius_sq(), 0.25);
    }
}
