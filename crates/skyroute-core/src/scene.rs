//! Scene configuration: control points, obstacles, world bounds and tuning.
//!
//! Scenes are JSON documents. Every tuning scalar has a default so a minimal
//! scene only needs control points, obstacles and bounds.

use std::path::Path;

use serde::Deserialize;

use crate::constants::*;
use crate::error::{Result, RouteError};
use crate::obstacle::Obstacle;
use crate::types::{Bounds, Vec3};

fn default_bezier_max_step() -> f64 {
    DEFAULT_BEZIER_MAX_STEP
}

fn default_rrt_step_size() -> f64 {
    DEFAULT_RRT_STEP_SIZE
}

fn default_rrt_radius() -> f64 {
    DEFAULT_RRT_RADIUS
}

fn default_rrt_max_iter() -> usize {
    DEFAULT_RRT_MAX_ITER
}

fn default_replan_interval() -> f64 {
    DEFAULT_REPLAN_INTERVAL
}

fn default_lookahead_factor() -> f64 {
    DEFAULT_LOOKAHEAD_FACTOR
}

/// Everything the planner and controller need to fly one mission.
#[derive(Debug, Clone, Deserialize)]
pub struct Scene {
    /// Spline control polygon: `[p0, c1, c2, p1, c2, p2, ...]`.
    pub control_points: Vec<Vec3>,
    #[serde(default)]
    pub obstacles: Vec<Obstacle>,
    pub bounds: Bounds,
    #[serde(default = "default_bezier_max_step")]
    pub bezier_max_step: f64,
    #[serde(default = "default_rrt_step_size")]
    pub rrt_step_size: f64,
    #[serde(default = "default_rrt_radius")]
    pub rrt_radius: f64,
    /// Fixed planner seed; `None` draws a fresh one per run.
    #[serde(default)]
    pub rrt_seed: Option<u64>,
    #[serde(default = "default_rrt_max_iter")]
    pub rrt_max_iter: usize,
    /// Seconds between replan cycles. Zero disables replanning.
    #[serde(default = "default_replan_interval")]
    pub replan_interval: f64,
    /// Lookahead radius as a multiple of `bezier_max_step`.
    #[serde(default = "default_lookahead_factor")]
    pub lookahead_factor: f64,
}

impl Scene {
    /// Scene with default tuning.
    pub fn new(control_points: Vec<Vec3>, obstacles: Vec<Obstacle>, bounds: Bounds) -> Self {
        Self {
            control_points,
            obstacles,
            bounds,
            bezier_max_step: DEFAULT_BEZIER_MAX_STEP,
            rrt_step_size: DEFAULT_RRT_STEP_SIZE,
            rrt_radius: DEFAULT_RRT_RADIUS,
            rrt_seed: None,
            rrt_max_iter: DEFAULT_RRT_MAX_ITER,
            replan_interval: DEFAULT_REPLAN_INTERVAL,
            lookahead_factor: DEFAULT_LOOKAHEAD_FACTOR,
        }
    }

    /// Load and validate a scene file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Parse and validate a scene document.
    pub fn from_json(text: &str) -> Result<Self> {
        let scene: Scene = serde_json::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    /// Check tuning scalars and bounds. Control point layout is checked when
    /// the spline is built.
    pub fn validate(&self) -> Result<()> {
        if self.control_points.is_empty() {
            return Err(RouteError::InvalidControlPoints { count: 0 });
        }
        self.bounds.validate()?;
        positive("bezier_max_step", self.bezier_max_step)?;
        positive("rrt_step_size", self.rrt_step_size)?;
        positive("rrt_radius", self.rrt_radius)?;
        if !self.replan_interval.is_finite() || self.replan_interval < 0.0 {
            return Err(RouteError::InvalidParameter {
                name: "replan_interval",
                value: self.replan_interval,
            });
        }
        if self.lookahead_factor.is_nan() || self.lookahead_factor < 1.0 {
            return Err(RouteError::InvalidParameter {
                name: "lookahead_factor",
                value: self.lookahead_factor,
            });
        }
        Ok(())
    }

    /// Where the vehicle starts: the first control point.
    pub fn start(&self) -> Vec3 {
        self.control_points.first().copied().unwrap_or_default()
    }

    /// Where the path ends: the last control point.
    pub fn goal(&self) -> Vec3 {
        self.control_points.last().copied().unwrap_or_default()
    }

    pub fn lookahead_radius(&self) -> f64 {
        self.bezier_max_step * self.lookahead_factor
    }

    /// Move every obstacle to its position at elapsed time `t`.
    pub fn update_obstacles(&mut self, t: f64) {
        for obstacle in &mut self.obstacles {
            obstacle.update(t);
        }
    }

    /// Motionless deep copy of every obstacle.
    pub fn obstacle_snapshot(&self) -> Vec<Obstacle> {
        self.obstacles.iter().map(Obstacle::snapshot).collect()
    }
}

fn positive(name: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(RouteError::InvalidParameter { name, value })
    }
}
