//! RRT* planner for bridging obstacle gaps.
//!
//! Nodes live in a flat arena; parent and child links are arena indices so
//! rewiring is an index overwrite. Sampling uses a seeded `ChaCha8Rng`, so a
//! fixed seed reproduces the exact same tree.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use skyroute_core::constants::{
    COLLISION_CHECK_STEP, DEFAULT_RRT_MAX_ITER, DEFAULT_RRT_RADIUS, DEFAULT_RRT_STEP_SIZE,
};
use skyroute_core::error::{Result, RouteError};
use skyroute_core::obstacle::Obstacle;
use skyroute_core::scene::Scene;
use skyroute_core::types::{Bounds, Positioned, Vec3};
use skyroute_core::waypoint::WaypointPath;

/// Planner tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RrtConfig {
    /// Maximum extension per iteration; also the goal-connect distance.
    pub step_size: f64,
    /// Upper bound on the adaptive neighbour radius.
    pub radius: f64,
    pub max_iter: usize,
    /// `None` draws a fresh seed per planner.
    pub seed: Option<u64>,
    /// Arc-length step when marching a segment for collisions.
    pub collision_step: f64,
}

impl Default for RrtConfig {
    fn default() -> Self {
        Self {
            step_size: DEFAULT_RRT_STEP_SIZE,
            radius: DEFAULT_RRT_RADIUS,
            max_iter: DEFAULT_RRT_MAX_ITER,
            seed: None,
            collision_step: COLLISION_CHECK_STEP,
        }
    }
}

impl RrtConfig {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            step_size: scene.rrt_step_size,
            radius: scene.rrt_radius,
            max_iter: scene.rrt_max_iter,
            seed: scene.rrt_seed,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("rrt step size", self.step_size, self.step_size > 0.0),
            ("rrt radius", self.radius, self.radius >= 0.0),
            ("collision step", self.collision_step, self.collision_step > 0.0),
        ];
        for (name, value, ok) in checks {
            if !ok || !value.is_finite() {
                return Err(RouteError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

/// Tree node. `parent` is `None` only for the root.
#[derive(Debug, Clone, PartialEq)]
pub struct RrtNode {
    pub position: Vec3,
    pub parent: Option<usize>,
    pub cost: f64,
    pub children: Vec<usize>,
}

impl RrtNode {
    fn root(position: Vec3) -> Self {
        Self {
            position,
            parent: None,
            cost: 0.0,
            children: Vec::new(),
        }
    }
}

impl Positioned for RrtNode {
    fn position(&self) -> Vec3 {
        self.position
    }
}

/// Result of one planner run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// Root-to-end vertex chain. Ends at the goal when `reached_goal`,
    /// otherwise at the explored node nearest the goal.
    pub vertices: Vec<Vec3>,
    pub reached_goal: bool,
    /// Iterations consumed, including the one that connected the goal.
    pub iterations: usize,
}

pub struct RrtStar {
    start: Vec3,
    goal: Vec3,
    bounds: Bounds,
    obstacles: Vec<Obstacle>,
    config: RrtConfig,
    seed: u64,
    rng: ChaCha8Rng,
    nodes: Vec<RrtNode>,
    goal_node: Option<usize>,
}

impl RrtStar {
    /// Planner over static copies of `obstacles`.
    pub fn new(
        start: Vec3,
        goal: Vec3,
        bounds: Bounds,
        obstacles: &[Obstacle],
        config: RrtConfig,
    ) -> Result<Self> {
        config.validate()?;
        bounds.validate()?;

        let seed = match config.seed {
            Some(seed) => seed,
            None => {
                let seed = rand::random::<u64>();
                log::info!("rrt: no seed configured, using {seed}");
                seed
            }
        };

        Ok(Self {
            start,
            goal,
            bounds,
            obstacles: obstacles.iter().map(Obstacle::snapshot).collect(),
            config,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            nodes: vec![RrtNode::root(start)],
            goal_node: None,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &RrtConfig {
        &self.config
    }

    /// Tree arena from the most recent `plan`. Index 0 is the root.
    pub fn nodes(&self) -> &[RrtNode] {
        &self.nodes
    }

    /// Cost of the goal node if the last run connected it.
    pub fn goal_cost(&self) -> Option<f64> {
        self.goal_node.map(|idx| self.nodes[idx].cost)
    }

    /// Grow the tree until the goal connects or the budget runs out.
    ///
    /// Every call restarts from a fresh tree and a freshly seeded RNG, so
    /// repeated calls on the same planner return the same outcome.
    pub fn plan(&mut self) -> PlanOutcome {
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.nodes = vec![RrtNode::root(self.start)];
        self.goal_node = None;

        for iteration in 1..=self.config.max_iter {
            let sample = self.sample();
            let nearest = self.nearest(sample);
            let new_pos = self.steer(self.nodes[nearest].position, sample);

            if self.path_is_obstructed(self.nodes[nearest].position, new_pos) {
                continue;
            }

            let neighbors = self.neighbors(new_pos);
            let (parent, cost) = self.choose_parent(nearest, new_pos, &neighbors);
            let new_idx = self.attach(new_pos, parent, cost);
            self.rewire(new_idx, &neighbors);

            if new_pos.distance(self.goal) < self.config.step_size
                && !self.path_is_obstructed(new_pos, self.goal)
            {
                let goal_cost = cost + new_pos.distance(self.goal);
                let goal_idx = self.attach(self.goal, new_idx, goal_cost);
                self.goal_node = Some(goal_idx);
                log::info!(
                    "rrt: goal reached after {iteration} iterations, {} nodes, cost {goal_cost:.3}",
                    self.nodes.len()
                );
                return PlanOutcome {
                    vertices: self.trace(goal_idx),
                    reached_goal: true,
                    iterations: iteration,
                };
            }
        }

        let closest = self.nearest(self.goal);
        log::warn!(
            "rrt: goal not reached in {} iterations, returning partial path ({:.3} short)",
            self.config.max_iter,
            self.nodes[closest].position.distance(self.goal)
        );
        PlanOutcome {
            vertices: self.trace(closest),
            reached_goal: false,
            iterations: self.config.max_iter,
        }
    }

    /// Plan and densify the vertex chain into a step-bounded path.
    pub fn waypoint_path(&mut self, max_step: f64) -> Result<WaypointPath> {
        if !(max_step.is_finite() && max_step > 0.0) {
            return Err(RouteError::InvalidParameter {
                name: "waypoint max step",
                value: max_step,
            });
        }
        let outcome = self.plan();
        Ok(densify(&outcome.vertices, max_step))
    }

    /// True if any point along `a -> b` lies inside an obstacle.
    ///
    /// Marches from `a` at `collision_step` increments and always tests `b`.
    pub fn path_is_obstructed(&self, a: Vec3, b: Vec3) -> bool {
        let blocked = |p: Vec3| self.obstacles.iter().any(|o| o.intersects_point(p));

        let delta = b - a;
        let length = delta.length();
        if length > 0.0 {
            let dir = delta / length;
            let mut t = 0.0;
            while t < length {
                if blocked(a + dir * t) {
                    return true;
                }
                t += self.config.collision_step;
            }
        }
        blocked(b)
    }

    fn sample(&mut self) -> Vec3 {
        let min = self.bounds.min;
        let extent = self.bounds.extent();
        let x = min.x + extent.x * self.rng.gen::<f64>();
        let y = min.y + extent.y * self.rng.gen::<f64>();
        let z = min.z + extent.z * self.rng.gen::<f64>();
        Vec3::new(x, y, z)
    }

    /// Linear scan; ties go to the earliest node.
    fn nearest(&self, point: Vec3) -> usize {
        self.nodes
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }

    fn steer(&self, from: Vec3, to: Vec3) -> Vec3 {
        let delta = to - from;
        let dist = delta.length();
        if dist == 0.0 {
            return from;
        }
        from + delta / dist * dist.min(self.config.step_size)
    }

    /// Neighbour radius shrinks as the tree grows.
    fn neighbor_radius(&self) -> f64 {
        let n = self.nodes.len() as f64;
        let schedule = self.config.step_size * ((n + 1.0).ln() / (n + 1.0)).sqrt();
        self.config.radius.min(schedule)
    }

    fn neighbors(&self, point: Vec3) -> Vec<usize> {
        let r = self.neighbor_radius();
        let r_sq = r * r;
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| node.position.distance_squared(point) <= r_sq)
            .map(|(idx, _)| idx)
            .collect()
    }

    fn choose_parent(&self, nearest: usize, point: Vec3, neighbors: &[usize]) -> (usize, f64) {
        let mut best = nearest;
        let mut best_cost = self.nodes[nearest].cost + self.nodes[nearest].position.distance(point);

        for &idx in neighbors {
            let node = &self.nodes[idx];
            if self.path_is_obstructed(node.position, point) {
                continue;
            }
            let cost = node.cost + node.position.distance(point);
            if cost < best_cost {
                best = idx;
                best_cost = cost;
            }
        }
        (best, best_cost)
    }

    fn attach(&mut self, position: Vec3, parent: usize, cost: f64) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(RrtNode {
            position,
            parent: Some(parent),
            cost,
            children: Vec::new(),
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Re-parent neighbours through `new_idx` where that strictly lowers their cost.
    fn rewire(&mut self, new_idx: usize, neighbors: &[usize]) {
        let new_pos = self.nodes[new_idx].position;
        let new_cost = self.nodes[new_idx].cost;
        let new_parent = self.nodes[new_idx].parent;

        for &idx in neighbors {
            if Some(idx) == new_parent {
                continue;
            }
            let node_pos = self.nodes[idx].position;
            let candidate = new_cost + new_pos.distance(node_pos);
            if candidate >= self.nodes[idx].cost || self.path_is_obstructed(new_pos, node_pos) {
                continue;
            }

            if let Some(old_parent) = self.nodes[idx].parent {
                self.nodes[old_parent].children.retain(|&c| c != idx);
            }
            self.nodes[new_idx].children.push(idx);
            self.nodes[idx].parent = Some(new_idx);

            let delta = candidate - self.nodes[idx].cost;
            self.shift_subtree_cost(idx, delta);
        }
    }

    fn shift_subtree_cost(&mut self, root: usize, delta: f64) {
        let mut stack = vec![root];
        while let Some(idx) = stack.pop() {
            self.nodes[idx].cost += delta;
            stack.extend(self.nodes[idx].children.iter().copied());
        }
    }

    fn trace(&self, mut idx: usize) -> Vec<Vec3> {
        let mut vertices = vec![self.nodes[idx].position];
        while let Some(parent) = self.nodes[idx].parent {
            vertices.push(self.nodes[parent].position);
            idx = parent;
        }
        vertices.reverse();
        vertices
    }
}

/// Subdivide each edge into `ceil(len / max_step)` equal pieces.
///
/// The last vertex is emitted unchanged, so a connected goal is hit exactly.
pub fn densify(vertices: &[Vec3], max_step: f64) -> WaypointPath {
    let mut positions = Vec::new();
    for pair in vertices.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let segment = b - a;
        let steps = ((segment.length() / max_step).ceil() as usize).max(1);
        positions.extend((0..steps).map(|j| a + segment * (j as f64 / steps as f64)));
    }
    positions.extend(vertices.last().copied());
    WaypointPath::from_positions(max_step, positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_bounds() -> Bounds {
        Bounds::new(Vec3::splat(-10.0), Vec3::splat(10.0)).unwrap()
    }

    fn seeded(seed: u64) -> RrtConfig {
        RrtConfig {
            seed: Some(seed),
            ..RrtConfig::default()
        }
    }

    #[test]
    fn test_steer_limits_extension() {
        let rrt = RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[], seeded(1)).unwrap();
        let stepped = rrt.steer(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        assert!((stepped - Vec3::X).length() < 1e-12);
        let short = rrt.steer(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(short, Vec3::new(0.5, 0.0, 0.0));
        assert_eq!(rrt.steer(Vec3::ONE, Vec3::ONE), Vec3::ONE);
    }

    #[test]
    fn test_neighbor_radius_shrinks() {
        let mut rrt = RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[], seeded(1)).unwrap();
        let r1 = rrt.neighbor_radius();
        for _ in 0..50 {
            rrt.nodes.push(RrtNode::root(Vec3::ZERO));
        }
        let r51 = rrt.neighbor_radius();
        assert!(r51 < r1);
        assert!(r1 <= rrt.config.radius);
    }

    #[test]
    fn test_obstruction_checks_endpoint() {
        let obstacle = Obstacle::new(Vec3::new(1.0, 0.0, 0.0), 0.05);
        let rrt = RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[obstacle], seeded(1)).unwrap();
        // 0.2 marching would step over a 0.05 sphere except at the endpoint.
        assert!(rrt.path_is_obstructed(Vec3::ZERO, Vec3::X));
        assert!(!rrt.path_is_obstructed(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0)));
        assert!(rrt.path_is_obstructed(Vec3::X, Vec3::X));
    }

    #[test]
    fn test_rewire_shifts_subtree_cost() {
        let mut rrt = RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[], seeded(1)).unwrap();
        // root -> a (detour) -> b; then c gives a shorter way to a.
        let a = rrt.attach(Vec3::new(0.0, 1.0, 0.0), 0, 5.0);
        let b = rrt.attach(Vec3::new(0.0, 2.0, 0.0), a, 6.0);
        let c = rrt.attach(Vec3::new(0.0, 0.5, 0.0), 0, 0.5);

        rrt.rewire(c, &[a]);

        assert_eq!(rrt.nodes[a].parent, Some(c));
        assert!((rrt.nodes[a].cost - 1.0).abs() < 1e-12);
        assert!((rrt.nodes[b].cost - 2.0).abs() < 1e-12);
        assert!(!rrt.nodes[0].children.contains(&a));
        assert!(rrt.nodes[c].children.contains(&a));
    }

    #[test]
    fn test_densify_forces_last_vertex() {
        let goal = Vec3::new(2.5, 0.3, -1.0);
        let vertices = [Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), goal];
        let path = densify(&vertices, 0.4);

        assert_eq!(path.first().unwrap().pos, Vec3::ZERO);
        assert_eq!(path.last().unwrap().pos, goal);
        assert!(path.max_gap() <= 0.4 + 1e-9);
        for (i, w) in path.points.iter().enumerate() {
            assert_eq!(w.index, i as u32);
        }
    }

    #[test]
    fn test_densify_single_vertex() {
        let path = densify(&[Vec3::ONE], 1.0);
        assert_eq!(path.len(), 1);
        assert_eq!(path.points[0].pos, Vec3::ONE);
    }

    #[test]
    fn test_samples_stay_in_bounds() {
        let bounds = Bounds::new(Vec3::new(-1.0, 2.0, 0.0), Vec3::new(3.0, 2.5, 8.0)).unwrap();
        let goal = Vec3::new(2.0, 2.3, 6.0);
        let mut rrt = RrtStar::new(Vec3::new(0.0, 2.2, 1.0), goal, bounds, &[], seeded(4)).unwrap();
        for _ in 0..500 {
            let sample = rrt.sample();
            assert!(bounds.contains(sample), "sample {sample} outside bounds");
        }
        rrt.plan();
        assert!(rrt.nodes().iter().all(|n| bounds.contains(n.position)));
    }

    #[test]
    fn test_drawn_seed_replays_run() {
        let obstacles = [Obstacle::new(Vec3::ZERO, 1.0)];
        let start = Vec3::new(-3.0, 0.0, 0.0);
        let goal = Vec3::new(3.0, 0.0, 0.0);

        let mut unseeded = RrtStar::new(start, goal, open_bounds(), &obstacles, RrtConfig::default())
            .unwrap();
        let first = unseeded.plan();

        let mut replay =
            RrtStar::new(start, goal, open_bounds(), &obstacles, seeded(unseeded.seed())).unwrap();
        assert_eq!(replay.seed(), unseeded.seed());
        assert_eq!(replay.plan(), first);
        assert_eq!(replay.nodes(), unseeded.nodes());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RrtConfig {
            step_size: 0.0,
            ..seeded(1)
        };
        assert!(RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[], config).is_err());

        let mut rrt = RrtStar::new(Vec3::ZERO, Vec3::X, open_bounds(), &[], seeded(1)).unwrap();
        assert!(rrt.waypoint_path(-1.0).is_err());
    }
}
