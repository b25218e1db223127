//! Flight loop: runs a [`Mission`] at 100 Hz on its own thread.
//!
//! Commands arrive via `mpsc` and are drained between ticks, so a reset never
//! lands mid-tick. The latest frame is stored in shared state for polling.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use skyroute_control::vehicle::{PidTuning, Vehicle};
use skyroute_core::constants::TICK_RATE;
use skyroute_core::error::Result;
use skyroute_core::scene::Scene;
use skyroute_core::state::{FrameSnapshot, SphereView, VehicleView};
use skyroute_core::waypoint::{Waypoint, WaypointPath};
use skyroute_planning::assembly::build_path;

use crate::handoff::PathReceiver;
use crate::state::{LoopCommand, SharedFrame, SharedView, WorldView};

/// Nominal duration of one tick.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MissionConfig {
    pub tuning: PidTuning,
}

/// Scene, vehicle and active path for one flight.
///
/// `epoch` increases on every reset. Replanned paths from an older epoch are
/// discarded when taken from the slot.
pub struct Mission {
    scene: Scene,
    config: MissionConfig,
    vehicle: Vehicle,
    path: Arc<WaypointPath>,
    receiver: PathReceiver,
    view: SharedView,
    epoch: u64,
    tick: u64,
    replans_applied: u32,
}

impl Mission {
    /// Plan the initial path and place the vehicle at the scene start.
    pub fn new(
        mut scene: Scene,
        config: MissionConfig,
        receiver: PathReceiver,
        view: SharedView,
    ) -> Result<Self> {
        scene.validate()?;
        scene.update_obstacles(0.0);
        let path = build_path(&scene)?;
        let mut vehicle = Vehicle::new(scene.start(), scene.lookahead_radius())?;
        vehicle.set_path(&path, config.tuning)?;
        log::info!("mission: initial path has {} waypoints", path.len());

        let mission = Self {
            scene,
            config,
            vehicle,
            path: Arc::new(path),
            receiver,
            view,
            epoch: 0,
            tick: 0,
            replans_applied: 0,
        };
        mission.publish_view();
        Ok(mission)
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn vehicle(&self) -> &Vehicle {
        &self.vehicle
    }

    pub fn path(&self) -> &Arc<WaypointPath> {
        &self.path
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn replans_applied(&self) -> u32 {
        self.replans_applied
    }

    /// Advance one tick at mission time `elapsed` (seconds since start or last reset).
    pub fn tick(&mut self, elapsed: f64) -> Result<FrameSnapshot> {
        self.scene.update_obstacles(elapsed);
        self.apply_replanned();
        let target = self.vehicle.follow_path_at(elapsed)?;
        self.tick += 1;
        self.publish_view();
        Ok(self.frame(elapsed, Some(target)))
    }

    /// Swap in a pending replanned path. Returns whether one was applied.
    fn apply_replanned(&mut self) -> bool {
        let Some(planned) = self.receiver.try_take() else {
            return false;
        };
        if planned.epoch != self.epoch {
            log::warn!(
                "mission: discarding replanned path from epoch {} (now {})",
                planned.epoch,
                self.epoch
            );
            return false;
        }
        if let Err(e) = self.vehicle.update_path(&planned.path) {
            log::warn!("mission: rejected replanned path: {}", e);
            return false;
        }

        self.path = Arc::new(planned.path);
        self.replans_applied += 1;
        log::info!("mission: swapped in replanned path ({} waypoints)", self.path.len());
        true
    }

    /// Back to the start: obstacles at `t = 0`, a freshly built path, the
    /// vehicle at rest and the hand-off slot emptied.
    pub fn reset(&mut self) -> Result<()> {
        self.epoch += 1;
        let dropped = self.receiver.drain();

        self.scene.update_obstacles(0.0);
        let path = build_path(&self.scene)?;
        self.vehicle.reset(self.scene.start());
        self.vehicle.set_path(&path, self.config.tuning)?;
        self.path = Arc::new(path);
        self.tick = 0;
        self.replans_applied = 0;
        self.publish_view();

        log::info!("mission: reset to epoch {}, dropped {dropped} pending path(s)", self.epoch);
        Ok(())
    }

    fn publish_view(&self) {
        let view = WorldView {
            position: self.vehicle.position(),
            target_index: self.vehicle.target().map_or(0, |w| w.index),
            obstacles: self.scene.obstacle_snapshot(),
            path: Arc::clone(&self.path),
            epoch: self.epoch,
        };
        if let Ok(mut lock) = self.view.lock() {
            *lock = Some(view);
        }
    }

    fn frame(&self, elapsed: f64, target: Option<Waypoint>) -> FrameSnapshot {
        FrameSnapshot {
            tick: self.tick,
            elapsed_secs: elapsed,
            vehicle: VehicleView {
                position: self.vehicle.position(),
                velocity: self.vehicle.velocity(),
            },
            target,
            obstacles: self.scene.obstacles.iter().map(SphereView::from).collect(),
            path_len: self.path.len(),
            replans_applied: self.replans_applied,
        }
    }
}

/// Handle to a running flight loop.
pub struct FlightLoop {
    commands: mpsc::Sender<LoopCommand>,
    handle: JoinHandle<()>,
}

impl FlightLoop {
    /// Send a command. Returns `false` if the loop has already stopped.
    pub fn send(&self, command: LoopCommand) -> bool {
        self.commands.send(command).is_ok()
    }

    /// Ask the loop to stop and wait for it.
    pub fn shutdown(self) {
        let _ = self.commands.send(LoopCommand::Shutdown);
        if let Err(e) = self.handle.join() {
            log::error!("Flight loop thread panicked: {:?}", e);
        }
    }
}

/// Spawn the flight loop thread. The mission moves into the thread.
pub fn spawn_flight_loop(mission: Mission, latest_frame: SharedFrame) -> Result<FlightLoop> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<LoopCommand>();

    let handle = std::thread::Builder::new()
        .name("skyroute-flight-loop".into())
        .spawn(move || {
            run_flight_loop(mission, cmd_rx, &latest_frame);
        })?;

    Ok(FlightLoop {
        commands: cmd_tx,
        handle,
    })
}

/// Apply every queued command. Returns `false` once the loop should stop.
///
/// A successful reset restarts mission time by moving `started` to now.
fn apply_commands(
    mission: &mut Mission,
    cmd_rx: &mpsc::Receiver<LoopCommand>,
    started: &mut Instant,
) -> bool {
    loop {
        match cmd_rx.try_recv() {
            Ok(LoopCommand::Reset) => match mission.reset() {
                Ok(()) => *started = Instant::now(),
                Err(e) => log::error!("Reset failed: {}", e),
            },
            Ok(LoopCommand::Shutdown) => return false,
            Err(mpsc::TryRecvError::Empty) => return true,
            Err(mpsc::TryRecvError::Disconnected) => return false,
        }
    }
}

/// The flight loop. Runs until Shutdown, channel disconnect or a tick error.
fn run_flight_loop(
    mut mission: Mission,
    cmd_rx: mpsc::Receiver<LoopCommand>,
    latest_frame: &Mutex<Option<FrameSnapshot>>,
) {
    let mut started = Instant::now();
    let mut next_tick_time = started;

    loop {
        // 1. Drain all pending commands
        if !apply_commands(&mut mission, &cmd_rx, &mut started) {
            return;
        }

        // 2. Advance one tick on mission time
        let elapsed = started.elapsed().as_secs_f64();
        let frame = match mission.tick(elapsed) {
            Ok(frame) => frame,
            Err(e) => {
                log::error!("Flight loop stopped: {}", e);
                return;
            }
        };

        // 3. Store latest frame for synchronous polling
        if let Ok(mut lock) = latest_frame.lock() {
            *lock = Some(frame);
        }

        // 4. Sleep until next tick
        next_tick_time += TICK_DURATION;
        let now = Instant::now();
        if next_tick_time > now {
            std::thread::sleep(next_tick_time - now);
        } else if now - next_tick_time > TICK_DURATION * 2 {
            // Too far behind, reset to avoid catch-up spiral
            next_tick_time = now;
        }
    }
}
