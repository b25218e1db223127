#[cfg(test)]
mod tests {
    use crate::constants::*;
    use crate::error::RouteError;
    use crate::obstacle::{Axis, LoopMode, Motion};
    use crate::scene::Scene;
    use crate::state::{FrameSnapshot, SphereView, VehicleView};
    use crate::types::{Bounds, Vec3};
    use crate::waypoint::Waypoint;

    const FULL_SCENE: &str = r#"{
        "control_points": [[-5,-5,-5], [-3,0,0], [3,0,0], [5,5,5], [10,5,5], [12,7,7]],
        "obstacles": [
            {"center": [4,4,4], "radius": 2.0},
            {"center": [0,0,0], "radius": 1.0,
             "motion": {"type": "circular", "orbit_center": [1,1,1], "orbit_radius": 2.0, "axis": "y", "speed": 0.5}},
            {"center": [0,0,0], "radius": 0.5,
             "motion": {"type": "linear", "points": [[0,0,0], [2,0,0]], "loop": "cycle"}}
        ],
        "bounds": {"min": [-5,-5,-5], "max": [12,7,7]},
        "bezier_max_step": 1.5,
        "rrt_step_size": 0.5,
        "rrt_radius": 2.5,
        "rrt_seed": 99,
        "rrt_max_iter": 400,
        "replan_interval": 3.0,
        "lookahead_factor": 2.0
    }"#;

    #[test]
    fn test_scene_full_document() {
        let scene = Scene::from_json(FULL_SCENE).unwrap();

        assert_eq!(scene.control_points.len(), 6);
        assert_eq!(scene.start(), Vec3::new(-5.0, -5.0, -5.0));
        assert_eq!(scene.goal(), Vec3::new(12.0, 7.0, 7.0));
        assert_eq!(scene.bezier_max_step, 1.5);
        assert_eq!(scene.rrt_seed, Some(99));
        assert_eq!(scene.rrt_max_iter, 400);
        assert_eq!(scene.lookahead_radius(), 3.0);

        assert!(!scene.obstacles[0].is_moving());
        match &scene.obstacles[1].motion {
            Some(Motion::Circular { axis, speed, phase, .. }) => {
                assert_eq!(*axis, Axis::Y);
                assert_eq!(*speed, 0.5);
                assert_eq!(*phase, 0.0);
            }
            other => panic!("expected circular motion, got {other:?}"),
        }
        match &scene.obstacles[2].motion {
            Some(Motion::Linear { loop_mode, speed, .. }) => {
                assert_eq!(*loop_mode, LoopMode::Cycle);
                assert_eq!(*speed, 1.0);
            }
            other => panic!("expected linear motion, got {other:?}"),
        }
    }

    #[test]
    fn test_moving_obstacle_starts_at_time_zero_position() {
        let scene = Scene::from_json(FULL_SCENE).unwrap();
        // Axis y orbits in the z-x plane, starting on +z.
        let orbiting = &scene.obstacles[1];
        assert!(orbiting.center.distance(Vec3::new(1.0, 1.0, 3.0)) < 1e-9);
    }

    #[test]
    fn test_scene_defaults() {
        let scene = Scene::from_json(
            r#"{
                "control_points": [[0,0,0], [1,0,0], [2,0,0], [3,0,0], [4,0,0], [5,0,0]],
                "bounds": {"min": [0,-1,-1], "max": [5,1,1]}
            }"#,
        )
        .unwrap();

        assert!(scene.obstacles.is_empty());
        assert_eq!(scene.bezier_max_step, DEFAULT_BEZIER_MAX_STEP);
        assert_eq!(scene.rrt_step_size, DEFAULT_RRT_STEP_SIZE);
        assert_eq!(scene.rrt_radius, DEFAULT_RRT_RADIUS);
        assert_eq!(scene.rrt_seed, None);
        assert_eq!(scene.rrt_max_iter, DEFAULT_RRT_MAX_ITER);
        assert_eq!(scene.replan_interval, DEFAULT_REPLAN_INTERVAL);
        assert_eq!(scene.lookahead_factor, DEFAULT_LOOKAHEAD_FACTOR);
    }

    #[test]
    fn test_unknown_motion_type_rejected() {
        let result = Scene::from_json(
            r#"{
                "control_points": [[0,0,0]],
                "obstacles": [{"center": [0,0,0], "radius": 1,
                               "motion": {"type": "spiral", "points": []}}],
                "bounds": {"min": [0,0,0], "max": [1,1,1]}
            }"#,
        );
        assert!(matches!(result, Err(RouteError::Scene(_))));
    }

    #[test]
    fn test_negative_radius_rejected() {
        let result = Scene::from_json(
            r#"{
                "control_points": [[0,0,0]],
                "obstacles": [{"center": [0,0,0], "radius": -1}],
                "bounds": {"min": [0,0,0], "max": [1,1,1]}
            }"#,
        );
        assert!(matches!(result, Err(RouteError::Scene(_))));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let result = Scene::from_json(
            r#"{
                "control_points": [[0,0,0]],
                "bounds": {"min": [0,2,0], "max": [1,1,1]}
            }"#,
        );
        assert!(matches!(result, Err(RouteError::InvalidBounds { .. })));
        assert!(Bounds::new(Vec3::ZERO, Vec3::ONE).is_ok());
    }

    #[test]
    fn test_non_positive_step_rejected() {
        let result = Scene::from_json(
            r#"{
                "control_points": [[0,0,0]],
                "bounds": {"min": [0,0,0], "max": [1,1,1]},
                "bezier_max_step": 0
            }"#,
        );
        assert!(matches!(
            result,
            Err(RouteError::InvalidParameter { name: "bezier_max_step", .. })
        ));
    }

    #[test]
    fn test_update_obstacles_moves_only_movers() {
        let mut scene = Scene::from_json(FULL_SCENE).unwrap();
        let static_center = scene.obstacles[0].center;

        scene.update_obstacles(1.0);

        assert_eq!(scene.obstacles[0].center, static_center);
        assert!(scene.obstacles[2].center.distance(Vec3::new(1.0, 0.0, 0.0)) < 1e-9);

        let snapshot = scene.obstacle_snapshot();
        assert_eq!(snapshot.len(), 3);
        assert!(snapshot.iter().all(|o| !o.is_moving()));
        assert_eq!(snapshot[2].center, scene.obstacles[2].center);
    }

    #[test]
    fn test_frame_snapshot_serde() {
        let frame = FrameSnapshot {
            tick: 12,
            elapsed_secs: 0.12,
            vehicle: VehicleView {
                position: Vec3::new(1.0, 2.0, 3.0),
                velocity: Vec3::new(0.5, 0.0, 0.0),
            },
            target: Some(Waypoint::new(Vec3::new(2.0, 2.0, 3.0), 7)),
            obstacles: vec![SphereView {
                center: Vec3::ZERO,
                radius: 1.0,
            }],
            path_len: 40,
            replans_applied: 1,
        };

        let json = serde_json::to_string(&frame).unwrap();
        assert!(json.contains("[1.0,2.0,3.0]"), "vectors serialize as arrays: {json}");
        let back: FrameSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
