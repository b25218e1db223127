//! Headless skyroute run: `skyroute [scene.json] [seconds]`.

use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use skyroute_app::control_loop::{spawn_flight_loop, Mission, MissionConfig};
use skyroute_app::handoff::handoff_slot;
use skyroute_app::replan::{ReplanConfig, ReplanWorker};
use skyroute_app::state::{shared_frame, shared_view};
use skyroute_core::error::Result;
use skyroute_core::scene::Scene;

const DEFAULT_SCENE: &str = "scenes/default.json";
const DEFAULT_SECONDS: f64 = 20.0;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let scene_path = args.next().unwrap_or_else(|| DEFAULT_SCENE.to_string());
    let seconds = match args.next().map(|s| s.parse::<f64>()) {
        None => DEFAULT_SECONDS,
        Some(Ok(secs)) if secs.is_finite() && secs >= 0.0 => secs,
        Some(_) => {
            log::error!("flight time must be a non-negative number of seconds");
            return ExitCode::FAILURE;
        }
    };

    match run(&scene_path, seconds) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(scene_path: &str, seconds: f64) -> Result<()> {
    let scene = Scene::from_file(scene_path)?;
    log::info!(
        "Loaded {}: {} control points, {} obstacles",
        scene_path,
        scene.control_points.len(),
        scene.obstacles.len()
    );

    let (publisher, receiver) = handoff_slot();
    let view = shared_view();
    let latest_frame = shared_frame();
    let running = Arc::new(AtomicBool::new(true));

    let mission = Mission::new(scene.clone(), MissionConfig::default(), receiver, view.clone())?;

    let worker = if scene.replan_interval > 0.0 {
        Some(ReplanWorker::spawn(
            ReplanConfig::from_scene(&scene),
            view,
            publisher,
            running.clone(),
        )?)
    } else {
        log::info!("Replanning disabled");
        None
    };

    let flight = spawn_flight_loop(mission, latest_frame.clone())?;
    std::thread::sleep(Duration::from_secs_f64(seconds));
    flight.shutdown();

    running.store(false, Ordering::Relaxed);
    if let Some(worker) = worker {
        worker.join();
    }

    let frame = latest_frame.lock().ok().and_then(|lock| lock.clone());
    match frame {
        Some(frame) => {
            let json = serde_json::to_string(&frame)?;
            log::info!("Final frame: {}", json);
        }
        None => log::warn!("Flight loop produced no frames"),
    }
    Ok(())
}
