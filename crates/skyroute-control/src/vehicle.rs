//! Point-mass vehicle: lookahead target selection, cascaded PID and
//! semi-implicit kinematic integration.

use std::time::Instant;

use skyroute_core::constants::VELOCITY_OUTPUT_LIMITS;
use skyroute_core::error::{Result, RouteError};
use skyroute_core::types::Vec3;
use skyroute_core::waypoint::{Waypoint, WaypointPath};
use skyroute_planning::kdtree::KdTree;

use crate::pid::{CascadedPid, PidGains};

/// Gains and output limits for the cascaded controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PidTuning {
    pub position: PidGains,
    pub velocity: PidGains,
    /// Desired-velocity clamp. `None` uses plus or minus the lookahead radius.
    pub position_limits: Option<(f64, f64)>,
    /// Acceleration command clamp.
    pub velocity_limits: (f64, f64),
}

impl Default for PidTuning {
    fn default() -> Self {
        Self {
            position: PidGains::position_default(),
            velocity: PidGains::velocity_default(),
            position_limits: None,
            velocity_limits: VELOCITY_OUTPUT_LIMITS,
        }
    }
}

/// Path-dependent state, present once a path has been set.
struct Guidance {
    index: KdTree<Waypoint>,
    target: Waypoint,
    max_step: f64,
    pid: CascadedPid,
}

pub struct Vehicle {
    position: Vec3,
    velocity: Vec3,
    acceleration: Vec3,
    lookahead: f64,
    last_update: Option<f64>,
    clock: Instant,
    guidance: Option<Guidance>,
}

impl Vehicle {
    /// Vehicle at rest at `position`, searching `lookahead` units for targets.
    pub fn new(position: Vec3, lookahead: f64) -> Result<Self> {
        if !(lookahead.is_finite() && lookahead > 0.0) {
            return Err(RouteError::InvalidParameter {
                name: "lookahead radius",
                value: lookahead,
            });
        }
        Ok(Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            lookahead,
            last_update: None,
            clock: Instant::now(),
            guidance: None,
        })
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec3 {
        self.acceleration
    }

    pub fn lookahead(&self) -> f64 {
        self.lookahead
    }

    /// Current lookahead target, `None` before a path is set.
    pub fn target(&self) -> Option<Waypoint> {
        self.guidance.as_ref().map(|g| g.target)
    }

    pub fn has_path(&self) -> bool {
        self.guidance.is_some()
    }

    /// Install a path and a fresh controller. Targets the first waypoint.
    ///
    /// Fails if the path is empty or its `max_step` exceeds the lookahead
    /// radius, since the vehicle could then sit between waypoints and see none.
    pub fn set_path(&mut self, path: &WaypointPath, tuning: PidTuning) -> Result<()> {
        let (index, target) = self.index_path(path)?;
        let position_limits = tuning
            .position_limits
            .unwrap_or((-self.lookahead, self.lookahead));
        let pid = CascadedPid::new(
            tuning.position,
            tuning.velocity,
            position_limits,
            tuning.velocity_limits,
        );

        self.guidance = Some(Guidance {
            index,
            target,
            max_step: path.max_step,
            pid,
        });
        log::debug!("vehicle: path set, {} waypoints", path.len());
        Ok(())
    }

    /// Swap in a replanned path, keeping PID and kinematic state.
    /// Retargets to the new path's first waypoint.
    pub fn update_path(&mut self, path: &WaypointPath) -> Result<()> {
        if self.guidance.is_none() {
            return Err(RouteError::PathNotSet);
        }
        let (index, target) = self.index_path(path)?;
        if let Some(guidance) = self.guidance.as_mut() {
            guidance.index = index;
            guidance.target = target;
            guidance.max_step = path.max_step;
        }
        log::debug!("vehicle: path updated, {} waypoints", path.len());
        Ok(())
    }

    fn index_path(&self, path: &WaypointPath) -> Result<(KdTree<Waypoint>, Waypoint)> {
        let first = *path.first().ok_or(RouteError::EmptyPath)?;
        if self.lookahead < path.max_step {
            return Err(RouteError::LookaheadTooSmall {
                lookahead: self.lookahead,
                max_step: path.max_step,
            });
        }
        Ok((KdTree::new(path.points.clone()), first))
    }

    /// One control tick on the vehicle's monotonic clock.
    pub fn follow_path(&mut self) -> Result<Waypoint> {
        let now = self.clock.elapsed().as_secs_f64();
        self.follow_path_at(now)
    }

    /// One control tick at time `now` (seconds, monotonic).
    ///
    /// Targets the highest-indexed waypoint within the lookahead radius, or
    /// keeps the previous target when none is in range. Returns the target.
    pub fn follow_path_at(&mut self, now: f64) -> Result<Waypoint> {
        let position = self.position;
        let velocity = self.velocity;
        let lookahead = self.lookahead;
        let guidance = self.guidance.as_mut().ok_or(RouteError::PathNotSet)?;

        if let Some(furthest) = guidance
            .index
            .search_radius(position, lookahead)
            .into_iter()
            .max_by_key(|w| w.index)
        {
            guidance.target = *furthest;
        }
        let target = guidance.target;

        let command = guidance.pid.update(position, velocity, target.pos, now);
        self.integrate(command, now);
        Ok(target)
    }

    /// Semi-implicit step: the previous acceleration moves the vehicle, then
    /// `command` becomes the acceleration for the next step.
    fn integrate(&mut self, command: Vec3, now: f64) {
        let dt = self.last_update.map_or(0.0, |prev| (now - prev).max(0.0));

        self.position += self.velocity * dt + 0.5 * self.acceleration * dt * dt;
        self.velocity += self.acceleration * dt;
        self.acceleration = command;
        self.last_update = Some(now);
    }

    /// Place the vehicle at rest at `position` and clear controller history.
    /// The active path, if any, is kept.
    pub fn reset(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.last_update = None;
        if let Some(guidance) = self.guidance.as_mut() {
            guidance.pid.reset();
        }
    }

    /// Spacing of the active path, `None` before a path is set.
    pub fn path_max_step(&self) -> Option<f64> {
        self.guidance.as_ref().map(|g| g.max_step)
    }
}
