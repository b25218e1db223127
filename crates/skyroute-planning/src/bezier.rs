//! Cubic Bezier segments, C1 splines and obstacle splitting.
//!
//! Segments are sampled by recursive bisection of the curve parameter until
//! every pair of adjacent samples is within `max_step`. Sampling is denser
//! where the curve bends and never exceeds the step bound.

use skyroute_core::constants::MAX_SUBDIVISION_DEPTH;
use skyroute_core::error::{Result, RouteError};
use skyroute_core::obstacle::Obstacle;
use skyroute_core::types::Vec3;
use skyroute_core::waypoint::{Waypoint, WaypointPath};

/// One cubic Bezier segment `[p0, c1, c2, p1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub control_points: [Vec3; 4],
}

impl CubicBezier {
    pub fn new(p0: Vec3, c1: Vec3, c2: Vec3, p1: Vec3) -> Self {
        Self {
            control_points: [p0, c1, c2, p1],
        }
    }

    /// Point on the curve for `t` in `[0, 1]` (Bernstein form).
    pub fn vec_at_t(&self, t: f64) -> Vec3 {
        let [p0, c1, c2, p1] = self.control_points;
        let u = 1.0 - t;
        p0 * (u * u * u) + c1 * (3.0 * u * u * t) + c2 * (3.0 * u * t * t) + p1 * (t * t * t)
    }

    /// Samples from `t = 0` to `t = 1` inclusive, adjacent samples at most `max_step` apart.
    pub fn subsample(&self, max_step: f64) -> Vec<Vec3> {
        let start = self.vec_at_t(0.0);
        let end = self.vec_at_t(1.0);

        let mut samples = vec![start];
        self.bisect(0.0, start, 1.0, end, max_step * max_step, 0, &mut samples);
        samples.push(end);
        samples
    }

    /// Push the interior samples of `(t0, t1)` in parameter order.
    #[allow(clippy::too_many_arguments)]
    fn bisect(
        &self,
        t0: f64,
        v0: Vec3,
        t1: f64,
        v1: Vec3,
        max_step_sq: f64,
        depth: u32,
        out: &mut Vec<Vec3>,
    ) {
        if v0.distance_squared(v1) <= max_step_sq || depth >= MAX_SUBDIVISION_DEPTH {
            return;
        }

        let t_mid = 0.5 * (t0 + t1);
        let v_mid = self.vec_at_t(t_mid);

        self.bisect(t0, v0, t_mid, v_mid, max_step_sq, depth + 1, out);
        out.push(v_mid);
        self.bisect(t_mid, v_mid, t1, v1, max_step_sq, depth + 1, out);
    }
}

/// C1-continuous chain of cubic segments, sampled into waypoints.
///
/// Control point layout is `[p0, c1, c2, p1, c2, p2, c2, p3, ...]`. Each
/// segment after the first gets its incoming handle by mirroring the previous
/// outgoing handle across the shared anchor.
#[derive(Debug, Clone)]
pub struct BezierSpline {
    control_points: Vec<Vec3>,
    segments: Vec<CubicBezier>,
    path: WaypointPath,
}

impl BezierSpline {
    /// Build and sample the spline. Needs an even number of control points,
    /// at least six, and a positive `max_step`.
    pub fn new(control_points: Vec<Vec3>, max_step: f64) -> Result<Self> {
        let count = control_points.len();
        if count < 5 || count % 2 != 0 {
            return Err(RouteError::InvalidControlPoints { count });
        }
        if !(max_step.is_finite() && max_step > 0.0) {
            return Err(RouteError::InvalidParameter {
                name: "bezier max step",
                value: max_step,
            });
        }

        let segments = Self::chain_segments(&control_points);

        let mut positions: Vec<Vec3> = Vec::new();
        for segment in &segments {
            let samples = segment.subsample(max_step);
            // Joins share an anchor; keep only one copy of it.
            let skip = usize::from(!positions.is_empty());
            positions.extend(samples.into_iter().skip(skip));
        }

        Ok(Self {
            control_points,
            segments,
            path: WaypointPath::from_positions(max_step, positions),
        })
    }

    fn chain_segments(cps: &[Vec3]) -> Vec<CubicBezier> {
        let segment_count = (cps.len() - 2) / 2;
        let mut segments = Vec::with_capacity(segment_count);
        segments.push(CubicBezier::new(cps[0], cps[1], cps[2], cps[3]));

        for i in 1..segment_count {
            let prev_c2 = cps[2 * i];
            let p0 = cps[2 * i + 1];
            let c2 = cps[2 * i + 2];
            let p1 = cps[2 * i + 3];
            let c1 = p0 + (p0 - prev_c2);
            segments.push(CubicBezier::new(p0, c1, c2, p1));
        }
        segments
    }

    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    pub fn segments(&self) -> &[CubicBezier] {
        &self.segments
    }

    pub fn max_step(&self) -> f64 {
        self.path.max_step
    }

    /// The full sampled spline.
    pub fn path(&self) -> &WaypointPath {
        &self.path
    }

    pub fn into_path(self) -> WaypointPath {
        self.path
    }

    /// Obstacle-free runs of the sampled spline. See [`split_by_obstacles`].
    pub fn split_by_obstacles(&self, obstacles: &[Obstacle]) -> Vec<WaypointPath> {
        split_by_obstacles(&self.path, obstacles)
    }
}

/// Drop every waypoint inside any obstacle and return the remaining runs in order.
///
/// Each run keeps the source `max_step` and is re-indexed from 0. Gaps between
/// runs are not bounded; bridging them is the planner's job.
pub fn split_by_obstacles(path: &WaypointPath, obstacles: &[Obstacle]) -> Vec<WaypointPath> {
    let mut runs = Vec::new();
    let mut current: Vec<Waypoint> = Vec::new();

    for waypoint in &path.points {
        let blocked = obstacles.iter().any(|o| o.intersects_point(waypoint.pos));
        if blocked {
            if !current.is_empty() {
                runs.push(finish_run(path.max_step, std::mem::take(&mut current)));
            }
        } else {
            current.push(*waypoint);
        }
    }
    if !current.is_empty() {
        runs.push(finish_run(path.max_step, current));
    }
    runs
}

fn finish_run(max_step: f64, points: Vec<Waypoint>) -> WaypointPath {
    let mut run = WaypointPath::new(max_step, points);
    run.reindex();
    run
}
