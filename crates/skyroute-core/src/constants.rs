//! Planner, controller and loop tuning defaults.

/// Control loop tick rate (Hz).
pub const TICK_RATE: u32 = 100;

/// Seconds per control tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Spatial index ---

/// Nodes holding fewer items than this become leaves.
pub const KD_LEAF_SIZE: usize = 5;

/// Depth past which the remaining items become a leaf.
pub const KD_MAX_DEPTH: usize = 10;

// --- Bezier spline ---

/// Default maximum distance between consecutive spline waypoints.
pub const DEFAULT_BEZIER_MAX_STEP: f64 = 2.0;

/// Recursion cap for adaptive bisection of a single Bezier segment.
pub const MAX_SUBDIVISION_DEPTH: u32 = 24;

// --- RRT* ---

/// Default extension distance per iteration.
pub const DEFAULT_RRT_STEP_SIZE: f64 = 1.0;

/// Default upper bound on the rewiring neighbourhood.
pub const DEFAULT_RRT_RADIUS: f64 = 2.0;

/// Default iteration budget per planner run.
pub const DEFAULT_RRT_MAX_ITER: usize = 1000;

/// Arc-length step used when marching a segment for collisions.
pub const COLLISION_CHECK_STEP: f64 = 0.2;

// --- Controller ---

/// Lookahead radius as a multiple of the path's max step.
pub const DEFAULT_LOOKAHEAD_FACTOR: f64 = 1.5;

/// Outer (position) loop gains: (kp, ki, kd).
pub const POSITION_GAINS: (f64, f64, f64) = (2.0, 0.0, 0.5);

/// Inner (velocity) loop gains: (kp, ki, kd).
pub const VELOCITY_GAINS: (f64, f64, f64) = (4.0, 0.0, 0.2);

/// Inner loop output limits (acceleration command, units/s²).
pub const VELOCITY_OUTPUT_LIMITS: (f64, f64) = (-10.0, 10.0);

// --- Replanning ---

/// Default seconds between replan cycles.
pub const DEFAULT_REPLAN_INTERVAL: f64 = 2.0;

/// Longest single sleep inside the replan worker, so shutdown stays responsive.
pub const REPLAN_SLEEP_SLICE_MS: u64 = 50;
