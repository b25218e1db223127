//! Frame snapshot: the visible state handed to a renderer after each control tick.

use serde::{Deserialize, Serialize};

use crate::obstacle::Obstacle;
use crate::types::Vec3;
use crate::waypoint::Waypoint;

/// Complete per-tick state for drawing and telemetry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub tick: u64,
    /// Seconds since the mission (re)started.
    pub elapsed_secs: f64,
    pub vehicle: VehicleView,
    /// Waypoint the controller is steering toward.
    pub target: Option<Waypoint>,
    pub obstacles: Vec<SphereView>,
    /// Number of waypoints on the active path.
    pub path_len: usize,
    /// Replanned paths swapped in since the last reset.
    pub replans_applied: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleView {
    pub position: Vec3,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SphereView {
    pub center: Vec3,
    pub radius: f64,
}

impl From<&Obstacle> for SphereView {
    fn from(obstacle: &Obstacle) -> Self {
        Self {
            center: obstacle.center,
            radius: obstacle.radius,
        }
    }
}
