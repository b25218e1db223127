//! Path planning for skyroute.
//!
//! Spatial indexing, Bezier path construction, RRT* gap bridging and
//! scene-level path assembly. Headless and deterministic under a fixed seed.

pub mod assembly;
pub mod bezier;
pub mod kdtree;
pub mod rrt;

pub use skyroute_core as core;

pub use assembly::{build_path, plan_bridge};
pub use bezier::{split_by_obstacles, BezierSpline, CubicBezier};
pub use kdtree::KdTree;
pub use rrt::{densify, PlanOutcome, RrtConfig, RrtNode, RrtStar};
