//! Background replanning.
//!
//! Every interval the worker clones the latest [`WorldView`], checks whether
//! any remaining waypoint is inside an obstacle snapshot and, if so, plans a
//! fresh RRT* path from the vehicle to the goal. Results go through the
//! hand-off slot; a full slot drops them.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use skyroute_core::constants::REPLAN_SLEEP_SLICE_MS;
use skyroute_core::error::Result;
use skyroute_core::obstacle::Obstacle;
use skyroute_core::scene::Scene;
use skyroute_core::types::{Bounds, Vec3};
use skyroute_core::waypoint::WaypointPath;
use skyroute_planning::rrt::{RrtConfig, RrtStar};

use crate::handoff::{PathPublisher, PlannedPath};
use crate::state::{SharedView, WorldView};

/// Replanner inputs that do not change during a mission.
#[derive(Debug, Clone, Copy)]
pub struct ReplanConfig {
    /// Time between replan cycles.
    pub interval: Duration,
    /// Longest single sleep, bounding shutdown latency.
    pub sleep_slice: Duration,
    pub goal: Vec3,
    pub bounds: Bounds,
    pub rrt: RrtConfig,
    /// Waypoint spacing for replanned paths.
    pub max_step: f64,
}

impl ReplanConfig {
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            interval: Duration::from_secs_f64(scene.replan_interval),
            sleep_slice: Duration::from_millis(REPLAN_SLEEP_SLICE_MS),
            goal: scene.goal(),
            bounds: scene.bounds,
            rrt: RrtConfig::from_scene(scene),
            max_step: scene.bezier_max_step,
        }
    }
}

/// True if any waypoint at or after `from_index` lies inside an obstacle.
pub fn path_is_threatened(path: &WaypointPath, from_index: u32, obstacles: &[Obstacle]) -> bool {
    path.points
        .iter()
        .filter(|w| w.index >= from_index)
        .any(|w| obstacles.iter().any(|o| o.intersects_point(w.pos)))
}

/// True if the path ends anywhere but `goal`, as a partial RRT* path does.
pub fn path_falls_short(path: &WaypointPath, goal: Vec3) -> bool {
    path.last().map_or(true, |w| w.pos != goal)
}

/// One replan cycle against `view`. `None` means the path ahead is clear
/// and already reaches the goal.
pub fn replan_cycle(config: &ReplanConfig, view: &WorldView) -> Result<Option<PlannedPath>> {
    let threatened = path_is_threatened(&view.path, view.target_index, &view.obstacles);
    let short = path_falls_short(&view.path, config.goal);
    if !threatened && !short {
        return Ok(None);
    }

    if threatened {
        log::info!(
            "replan: path threatened past waypoint {}, planning from {}",
            view.target_index,
            view.position
        );
    } else {
        log::info!("replan: path stops short of the goal, planning from {}", view.position);
    }
    let mut rrt = RrtStar::new(view.position, config.goal, config.bounds, &view.obstacles, config.rrt)?;
    let path = rrt.waypoint_path(config.max_step)?;

    Ok(Some(PlannedPath {
        epoch: view.epoch,
        path,
    }))
}

/// Handle to the replan worker thread.
pub struct ReplanWorker {
    handle: JoinHandle<()>,
}

impl ReplanWorker {
    /// Spawn the worker. It runs until `running` is cleared.
    pub fn spawn(
        config: ReplanConfig,
        view: SharedView,
        publisher: PathPublisher,
        running: Arc<AtomicBool>,
    ) -> Result<Self> {
        let handle = thread::Builder::new()
            .name("skyroute-replan".into())
            .spawn(move || run_replan_loop(config, view, publisher, running))?;
        Ok(Self { handle })
    }

    /// Wait for the thread to finish.
    pub fn join(self) {
        if let Err(e) = self.handle.join() {
            log::error!("Replan thread panicked: {:?}", e);
        }
    }
}

fn run_replan_loop(
    config: ReplanConfig,
    view: SharedView,
    publisher: PathPublisher,
    running: Arc<AtomicBool>,
) {
    log::info!("Replan thread started, interval {:?}", config.interval);

    while sleep_while_running(config.interval, config.sleep_slice, &running) {
        let snapshot = match view.lock() {
            Ok(guard) => guard.clone(),
            Err(e) => {
                log::error!("Failed to read world view: {}", e);
                break;
            }
        };
        let Some(snapshot) = snapshot else {
            continue;
        };

        let started = Instant::now();
        match replan_cycle(&config, &snapshot) {
            Ok(Some(planned)) => {
                let len = planned.path.len();
                if publisher.try_put(planned) {
                    log::info!("replan: offered {len} waypoints in {:?}", started.elapsed());
                } else {
                    log::debug!("replan: slot full, dropped result");
                }
            }
            Ok(None) => log::debug!("replan: path ahead is clear"),
            Err(e) => log::warn!("replan failed: {}", e),
        }
    }

    log::info!("Replan thread stopped");
}

/// Sleep for `total` in slices. Returns `false` as soon as `running` is cleared.
fn sleep_while_running(total: Duration, slice: Duration, running: &AtomicBool) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if !running.load(Ordering::Relaxed) {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep(slice.min(deadline - now));
    }
}
