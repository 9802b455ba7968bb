//! Gate Runner entry point
//!
//! Runs the simulation headless against the in-memory scene and prints a
//! run summary as JSON.
//!
//! Usage: `gate-runner [tuning.json] [seconds] [seed]`

use std::time::{SystemTime, UNIX_EPOCH};

use gate_runner::Tuning;
use gate_runner::consts::*;
use gate_runner::sim::{GameEvent, GamePhase, GameState, SceneWorld, TickInput, tick};

/// Game overs answered with an automatic retry before the runner gives up
const MAX_RETRIES: u32 = 3;
/// Host frame length fed into the fixed-step accumulator
const FRAME_DT: f32 = 1.0 / 60.0;
/// Simulated seconds when none are given
const DEFAULT_SECONDS: f32 = 120.0;

struct Args {
    tuning: Tuning,
    seconds: f32,
    seed: u64,
}

fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let tuning = match args.first().map(String::as_str) {
        Some(path) if path != "-" => Tuning::load(path),
        _ => Tuning::default(),
    };

    let seconds = match args.get(1) {
        Some(raw) => raw.parse::<f32>().unwrap_or_else(|_| {
            log::warn!("Invalid duration '{}', using {}s", raw, DEFAULT_SECONDS);
            DEFAULT_SECONDS
        }),
        None => DEFAULT_SECONDS,
    };

    let seed = match args.get(2).map(|raw| raw.parse::<u64>()) {
        Some(Ok(seed)) => seed,
        Some(Err(_)) | None => {
            let seed = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0);
            log::info!("No seed given, using {}", seed);
            seed
        }
    };

    Args {
        tuning,
        seconds: gate_runner::non_negative(seconds),
        seed,
    }
}

fn main() {
    env_logger::init();
    log::info!("Gate Runner (headless) starting...");

    let args = parse_args();
    let mut world = SceneWorld::new();
    let mut state = GameState::new(args.tuning, args.seed, &mut world);
    log::info!("Game initialized with seed: {}", args.seed);

    let mut input = TickInput::default();
    let mut accumulator = 0.0_f32;
    let mut simulated = 0.0_f32;
    let mut retries = 0;
    let mut total_kills = 0;

    while simulated < args.seconds {
        accumulator += FRAME_DT;
        simulated += FRAME_DT;

        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut state, &mut world, &input, SIM_DT);
            input = TickInput::default();
            accumulator -= SIM_DT;
            substeps += 1;
        }

        for event in state.drain_events() {
            match event {
                GameEvent::EnemyDefeated { ordinal, .. } => {
                    total_kills += 1;
                    log::debug!("Enemy #{} down", ordinal + 1);
                }
                GameEvent::GameOver => log::info!("Game over at {:.1}s", simulated),
                _ => {}
            }
        }

        if state.phase() == GamePhase::GameOver {
            if retries >= MAX_RETRIES {
                log::info!("Out of retries");
                break;
            }
            retries += 1;
            log::info!("Retrying ({}/{})", retries, MAX_RETRIES);
            input.retry = true;
        }
    }

    let snapshot = state.snapshot(&world);
    log::info!(
        "Finished after {:.1}s: {} kills across {} attempts",
        simulated,
        total_kills,
        retries + 1
    );
    match serde_json::to_string_pretty(&snapshot) {
        Ok(json) => println!("{}", json),
        Err(e) => log::error!("Failed to serialize run summary: {}", e),
    }
}
