//! Core types and definitions for the skyroute planner.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geometry, waypoints and paths, obstacles, scene configuration,
//! frame snapshots, constants and the error type.
//! It has no dependency on threads, planning or control.

pub mod constants;
pub mod error;
pub mod obstacle;
pub mod scene;
pub mod state;
pub mod types;
pub mod waypoint;

pub use error::{Result, RouteError};
pub use obstacle::{Axis, LoopMode, Motion, Obstacle};
pub use scene::Scene;
pub use types::{Bounds, Positioned, Vec3};
pub use waypoint::{merge_paths, Waypoint, WaypointPath};

#[cfg(test)]
mod tests;
