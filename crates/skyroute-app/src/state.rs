//! State shared between the flight loop, the replan worker and the host.

use std::sync::{Arc, Mutex};

use skyroute_core::obstacle::Obstacle;
use skyroute_core::state::FrameSnapshot;
use skyroute_core::types::Vec3;
use skyroute_core::waypoint::WaypointPath;

/// Commands sent from the host to the flight loop thread.
#[derive(Debug)]
pub enum LoopCommand {
    /// Rebuild the initial path and put the vehicle back at the start.
    Reset,
    /// Stop the flight loop thread.
    Shutdown,
}

/// What the replanner needs from one flight loop tick.
///
/// Obstacles are motionless snapshots and the path is shared by `Arc`, so
/// cloning a view out of the lock is cheap and never races the loop.
#[derive(Debug, Clone)]
pub struct WorldView {
    pub position: Vec3,
    /// Index of the vehicle's current target waypoint on `path`.
    pub target_index: u32,
    pub obstacles: Vec<Obstacle>,
    pub path: Arc<WaypointPath>,
    pub epoch: u64,
}

/// Latest world view, written by the flight loop after every tick.
pub type SharedView = Arc<Mutex<Option<WorldView>>>;

/// Latest frame, for synchronous polling by the host.
pub type SharedFrame = Arc<Mutex<Option<FrameSnapshot>>>;

pub fn shared_view() -> SharedView {
    Arc::new(Mutex::new(None))
}

pub fn shared_frame() -> SharedFrame {
    Arc::new(Mutex::new(None))
}
