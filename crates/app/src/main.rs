//! `blendsim`: headless water-blending plant.
//!
//! ```text
//! blendsim                    real-time loop, one JSON reading per step
//! blendsim --test             10 deterministic steps (seed 12345)
//! blendsim --generate [N]     N seconds of readings at 2 s spacing (default 3600)
//! blendsim --train <path>     fit and save a forest (.json or binary)
//! blendsim --agent            JSON command protocol on stdin/stdout
//! ```
//!
//! `--seed <n>` overrides the seed for every mode.

mod agent_mode;
mod train;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bevy::app::ScheduleRunnerPlugin;
use bevy::log::LogPlugin;
use bevy::prelude::*;

use blending::config::DEFAULT_SEED;
use blending::simulation::{SimulationConfig, SimulationReading, SimulationState};
use blending::systems::{PredictionReady, SimulationStepped};
use blending::BlendingPlugin;

const TEST_STEPS: usize = 10;
const DEFAULT_GENERATE_SECS: u64 = 3_600;
const GENERATE_INTERVAL_SECS: u64 = 2;
const DEFAULT_MODEL_PATH: &str = "rain_forest_model.json";

#[derive(Debug, PartialEq)]
enum Mode {
    RealTime,
    Test,
    Generate(u64),
    Train(PathBuf),
    Agent,
}

#[derive(Debug, PartialEq)]
struct Cli {
    mode: Mode,
    seed: u64,
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut mode = Mode::RealTime;
    let mut seed = DEFAULT_SEED;
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--test" => mode = Mode::Test,
            "--agent" => mode = Mode::Agent,
            "--generate" => {
                let secs = match args.get(i + 1).map(|s| s.parse::<u64>()) {
                    Some(Ok(secs)) => {
                        i += 1;
                        secs
                    }
                    _ => DEFAULT_GENERATE_SECS,
                };
                mode = Mode::Generate(secs);
            }
            "--train" => {
                let path = match args.get(i + 1).filter(|a| !a.starts_with("--")) {
                    Some(path) => {
                        i += 1;
                        PathBuf::from(path)
                    }
                    None => PathBuf::from(DEFAULT_MODEL_PATH),
                };
                mode = Mode::Train(path);
            }
            "--seed" => {
                let value = args.get(i + 1).ok_or("--seed needs a value")?;
                seed = value
                    .parse()
                    .map_err(|e| format!("invalid seed {value:?}: {e}"))?;
                i += 1;
            }
            other => return Err(format!("unknown argument {other:?}")),
        }
        i += 1;
    }
    Ok(Cli { mode, seed })
}

/// Wall clock in Unix epoch milliseconds.
pub(crate) fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_millis() as u64)
}

/// `--test` output: the first steps of a session with the clock at epoch 0.
fn test_readings(seed: u64) -> Vec<SimulationReading> {
    let mut state = SimulationState::with_seed(seed);
    (0..TEST_STEPS).map(|_| state.step()).collect()
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("blendsim: {e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.mode {
        Mode::Test => print_json(&test_readings(cli.seed)),
        Mode::Generate(secs) => {
            let mut state = SimulationState::new(SimulationConfig {
                seed: cli.seed,
                epoch_ms: unix_millis(),
                ..Default::default()
            });
            print_json(&state.generate_time_series(secs, GENERATE_INTERVAL_SECS))
        }
        Mode::Train(path) => {
            // One-shot command; the tracing subscriber is installed by hand
            // instead of through an App.
            let mut app = App::new();
            app.add_plugins(LogPlugin::default());
            match train::run_train(&path, cli.seed, unix_millis()) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    error!("Training failed: {e}");
                    ExitCode::FAILURE
                }
            }
        }
        Mode::Agent => {
            agent_mode::run_agent_mode(cli.seed);
            ExitCode::SUCCESS
        }
        Mode::RealTime => {
            run_real_time(cli.seed);
            ExitCode::SUCCESS
        }
    }
}

fn run_real_time(seed: u64) {
    App::new()
        .add_plugins(
            MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(Duration::from_secs_f64(
                1.0 / 30.0,
            ))),
        )
        .add_plugins(LogPlugin::default())
        .insert_resource(SimulationConfig {
            seed,
            epoch_ms: unix_millis(),
            ..Default::default()
        })
        .add_plugins(BlendingPlugin)
        .add_systems(Update, (print_readings, log_predictions))
        .run();
}

fn print_readings(mut stepped: EventReader<SimulationStepped>) {
    for SimulationStepped(reading) in stepped.read() {
        match serde_json::to_string(reading) {
            Ok(json) => println!("{json}"),
            Err(e) => error!("Failed to serialize reading: {e}"),
        }
    }
}

fn log_predictions(mut ready: EventReader<PredictionReady>) {
    for PredictionReady(report) in ready.read() {
        info!(
            "Predicted {} ppm in 60 s ({:?}, confidence {:.2}), optimal ro share {:.2}, {}",
            report.predicted_tds,
            report.trend,
            report.confidence,
            report.optimal_blend_ratio.ro,
            report.storm_alert.message()
        );
    }
}
