//! Scene-level path assembly: spline, split, bridge, merge.

use skyroute_core::error::Result;
use skyroute_core::obstacle::Obstacle;
use skyroute_core::scene::Scene;
use skyroute_core::types::Vec3;
use skyroute_core::waypoint::{merge_paths, WaypointPath};

use crate::bezier::BezierSpline;
use crate::rrt::{RrtConfig, RrtStar};

/// Build the initial flight path for `scene` against its current obstacles.
///
/// The spline is split around obstacles and each gap between consecutive
/// free runs is bridged with an RRT* path, giving
/// `[seg0, bridge0, seg1, ..., segN]` merged into one densely indexed path.
/// If no spline waypoint is free, one RRT* run from start to goal is the path.
pub fn build_path(scene: &Scene) -> Result<WaypointPath> {
    scene.validate()?;

    let spline = BezierSpline::new(scene.control_points.clone(), scene.bezier_max_step)?;
    let segments = spline.split_by_obstacles(&scene.obstacles);
    log::info!(
        "spline: {} waypoints, {} obstacle-free segment(s)",
        spline.path().len(),
        segments.len()
    );

    let Some((first, rest)) = segments.split_first() else {
        log::warn!("every spline waypoint is obstructed, planning start to goal directly");
        return plan_bridge(scene, &scene.obstacles, scene.start(), scene.goal());
    };

    let mut pieces = Vec::with_capacity(segments.len() * 2 - 1);
    pieces.push(first.clone());
    let mut previous = first;
    for segment in rest {
        let (Some(from), Some(to)) = (previous.last(), segment.first()) else {
            continue;
        };
        log::debug!("bridging gap {} -> {}", from.pos, to.pos);
        pieces.push(plan_bridge(scene, &scene.obstacles, from.pos, to.pos)?);
        pieces.push(segment.clone());
        previous = segment;
    }

    merge_paths(&pieces)
}

/// One RRT* run between two points using the scene's planner tuning,
/// densified to the scene's spline step.
pub fn plan_bridge(
    scene: &Scene,
    obstacles: &[Obstacle],
    from: Vec3,
    to: Vec3,
) -> Result<WaypointPath> {
    let mut rrt = RrtStar::new(from, to, scene.bounds, obstacles, RrtConfig::from_scene(scene))?;
    rrt.waypoint_path(scene.bezier_max_step)
}
