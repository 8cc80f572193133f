//! Headless `--agent` mode: a blocking synchronous loop that reads JSON
//! commands from stdin and writes JSON responses to stdout.
//!
//! Each line of stdin is a JSON object with a `"cmd"` discriminator. Each
//! line of stdout is a JSON response with `"protocol_version"` and `"type"`
//! fields. See [`blending::agent_protocol`] for the full schema. Log output
//! goes to stderr so it never interleaves with the protocol.

use std::io::{BufRead, Write};

use bevy::log::LogPlugin;
use bevy::prelude::*;

use blending::agent_protocol::{
    error_response, make_response, AgentCommand, AgentResponse, ResponsePayload,
    PROTOCOL_VERSION,
};
use blending::predictor::WaterPredictor;
use blending::simulation::{SimulationConfig, SimulationState};
use blending::systems::LatestReport;
use blending::tank::{BlendRatio, TankType};
use blending::{use_manual_step_clock, BlendingPlugin};

/// Upper bound on ticks per `step` command.
const MAX_TICKS_PER_COMMAND: u64 = 10_000;

/// Plant app without a runner; every `app.update()` is one fixed step.
pub fn build_agent_app(seed: u64, with_log: bool) -> App {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins);
    use_manual_step_clock(&mut app);
    if with_log {
        app.add_plugins(LogPlugin::default());
    }
    app.insert_resource(SimulationConfig {
        seed,
        epoch_ms: crate::unix_millis(),
        ..Default::default()
    });
    app.add_plugins(BlendingPlugin);
    // Initial update so Startup systems execute.
    app.update();
    app
}

pub fn run_agent_mode(seed: u64) {
    let mut app = build_agent_app(seed, true);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    write_response(&mut stdout, &make_response(ResponsePayload::Ready));
    info!(
        "blendsim agent mode v{} ready, waiting for commands on stdin",
        PROTOCOL_VERSION
    );

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                error!("stdin read error: {e}");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let cmd: AgentCommand = match serde_json::from_str(&line) {
            Ok(c) => c,
            Err(e) => {
                write_response(&mut stdout, &error_response(format!("Parse error: {e}")));
                continue;
            }
        };

        let response = process_command(cmd, &mut app);
        let is_goodbye = matches!(response.payload, ResponsePayload::Goodbye);
        write_response(&mut stdout, &response);

        if is_goodbye {
            break;
        }
    }

    info!("blendsim agent mode shutting down");
}

fn write_response(out: &mut impl Write, response: &AgentResponse) {
    match serde_json::to_string(response) {
        Ok(json) => {
            let _ = writeln!(out, "{json}");
            let _ = out.flush();
        }
        Err(e) => error!("Failed to serialize response: {e}"),
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Boundary mutations are applied to the resources directly so the response
/// reflects them immediately, without waiting for a tick.
pub fn process_command(cmd: AgentCommand, app: &mut App) -> AgentResponse {
    match cmd {
        AgentCommand::Step { ticks } => {
            let n = ticks.min(MAX_TICKS_PER_COMMAND);
            for _ in 0..n {
                app.update();
            }
            let reading = app.world().resource::<SimulationState>().current_reading();
            make_response(ResponsePayload::Reading { reading })
        }

        AgentCommand::Current => {
            let reading = app.world().resource::<SimulationState>().current_reading();
            make_response(ResponsePayload::Reading { reading })
        }

        AgentCommand::History { limit } => {
            let readings = app.world().resource::<SimulationState>().history(limit);
            make_response(ResponsePayload::History { readings })
        }

        AgentCommand::Reset { seed } => {
            let world = app.world_mut();
            {
                let mut state = world.resource_mut::<SimulationState>();
                let seed = seed.unwrap_or_else(|| state.seed());
                state.reset(seed);
            }
            world.resource_mut::<WaterPredictor>().reset();
            world.resource_mut::<LatestReport>().0 = None;
            make_response(ResponsePayload::Ok)
        }

        AgentCommand::Blend { ro, rain } => {
            let mut state = app.world_mut().resource_mut::<SimulationState>();
            match state.set_blend_ratio(ro, rain) {
                Ok(blend_ratio) => make_response(ResponsePayload::BlendRatio { blend_ratio }),
                Err(e) => error_response(e.to_string()),
            }
        }

        AgentCommand::Fill { tank, level } => {
            let mut state = app.world_mut().resource_mut::<SimulationState>();
            match state.fill_tank(tank, level) {
                Ok(level) => make_response(ResponsePayload::TankLevel { tank, level }),
                Err(e) => error_response(e.to_string()),
            }
        }

        AgentCommand::Generate { duration, interval } => {
            // Scratch copy: the live session keeps its clock and history.
            let mut scratch = app.world().resource::<SimulationState>().clone();
            let readings = scratch.generate_time_series(duration, interval);
            make_response(ResponsePayload::Series { readings })
        }

        AgentCommand::Predict => {
            let world = app.world();
            let report = match &world.resource::<LatestReport>().0 {
                Some(report) => report.clone(),
                None => {
                    let reading = world.resource::<SimulationState>().current_reading();
                    let mut predictor = world.resource::<WaterPredictor>().clone();
                    predictor.get_prediction_report(&reading.tanks, reading.blend_ratio)
                }
            };
            make_response(ResponsePayload::Prediction {
                report: Box::new(report),
            })
        }

        AgentCommand::Ingest {
            mut readings,
            blend_ratio,
        } => {
            for tank in TankType::ALL {
                if let Err(e) = readings.get(tank).validate(tank) {
                    return error_response(e.to_string());
                }
            }
            let world = app.world_mut();
            let ratio = match blend_ratio {
                Some(raw) => match BlendRatio::new(raw.ro, raw.rain) {
                    Ok(ratio) => ratio,
                    Err(e) => return error_response(e.to_string()),
                },
                None => world.resource::<SimulationState>().blend_ratio(),
            };
            let now = crate::unix_millis();
            for tank in TankType::ALL {
                let reading = readings.get_mut(tank);
                if reading.timestamp_ms == 0 {
                    reading.timestamp_ms = now;
                }
            }
            let report = world
                .resource_mut::<WaterPredictor>()
                .get_prediction_report(&readings, ratio);
            world.resource_mut::<LatestReport>().0 = Some(report.clone());
            make_response(ResponsePayload::Prediction {
                report: Box::new(report),
            })
        }

        AgentCommand::Quit => make_response(ResponsePayload::Goodbye),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use blending::analytics::Trend;

    fn send(app: &mut App, json: &str) -> serde_json::Value {
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        let response = process_command(cmd, app);
        serde_json::to_value(&response).unwrap()
    }

    #[test]
    fn test_step_advances_and_reports_reading() {
        let mut app = build_agent_app(12345, false);
        let resp = send(&mut app, r#"{"cmd":"step","ticks":5}"#);
        assert_eq!(resp["protocol_version"], 1);
        assert_eq!(resp["type"], "reading");
        assert_eq!(resp["reading"]["timestep"], 5);

        let resp = send(&mut app, r#"{"cmd":"history","limit":3}"#);
        assert_eq!(resp["type"], "history");
        assert_eq!(resp["readings"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_long_step_keeps_event_buffers_bounded() {
        use blending::systems::{PredictionReady, SimulationStepped};

        let mut app = build_agent_app(12345, false);
        let resp = send(&mut app, r#"{"cmd":"step","ticks":300}"#);
        assert_eq!(resp["reading"]["timestep"], 300);
        assert!(app.world().resource::<Events<SimulationStepped>>().len() <= 2);
        assert!(app.world().resource::<Events<PredictionReady>>().len() <= 2);
    }

    #[test]
    fn test_blend_is_normalized_or_rejected() {
        let mut app = build_agent_app(1, false);
        let resp = send(&mut app, r#"{"cmd":"blend","ro":1,"rain":1}"#);
        assert_eq!(resp["type"], "blend_ratio");
        assert_eq!(resp["blend_ratio"]["ro"], 0.5);

        let resp = send(&mut app, r#"{"cmd":"blend","ro":0,"rain":0}"#);
        assert_eq!(resp["type"], "error");
        let ratio = app.world().resource::<SimulationState>().blend_ratio();
        assert_eq!(ratio.ro, 0.5);
    }

    #[test]
    fn test_fill_clamps_level() {
        let mut app = build_agent_app(1, false);
        let resp = send(&mut app, r#"{"cmd":"fill","tank":"rainwater","level":250}"#);
        assert_eq!(resp["type"], "tank_level");
        assert_eq!(resp["level"], 100.0);
    }

    #[test]
    fn test_reset_restores_seeded_start() {
        let mut app = build_agent_app(99, false);
        let start = send(&mut app, r#"{"cmd":"current"}"#);
        send(&mut app, r#"{"cmd":"step","ticks":12}"#);
        let resp = send(&mut app, r#"{"cmd":"reset"}"#);
        assert_eq!(resp["type"], "ok");
        let after = send(&mut app, r#"{"cmd":"current"}"#);
        assert_eq!(after["reading"]["tanks"], start["reading"]["tanks"]);
        assert_eq!(app.world().resource::<WaterPredictor>().history_len(), 0);
    }

    #[test]
    fn test_generate_leaves_session_untouched() {
        let mut app = build_agent_app(7, false);
        send(&mut app, r#"{"cmd":"step","ticks":4}"#);
        let resp = send(&mut app, r#"{"cmd":"generate","duration":20,"interval":2}"#);
        assert_eq!(resp["type"], "series");
        assert_eq!(resp["readings"].as_array().unwrap().len(), 10);
        assert_eq!(app.world().resource::<SimulationState>().timestep(), 4);
    }

    #[test]
    fn test_predict_before_any_step_is_learning() {
        let mut app = build_agent_app(3, false);
        let resp = send(&mut app, r#"{"cmd":"predict"}"#);
        assert_eq!(resp["type"], "prediction");
        assert_eq!(resp["report"]["trend"], "learning");
        assert_eq!(app.world().resource::<WaterPredictor>().history_len(), 0);
    }

    fn ingest_json(blended_tds: f64, timestamp: u64) -> String {
        let reading = |tds: f64| {
            format!(
                r#"{{"timestamp":{timestamp},"tds":{tds},"temperature":25,"level":50,"flowRate":1.5}}"#
            )
        };
        format!(
            r#"{{"cmd":"ingest","readings":{{"ro_reject":{},"rainwater":{},"blended":{}}}}}"#,
            reading(1000.0),
            reading(50.0),
            reading(blended_tds),
        )
    }

    #[test]
    fn test_ingest_feeds_predictor() {
        let mut app = build_agent_app(3, false);
        for i in 0..8u64 {
            let json = ingest_json(200.0 + i as f64, 1_000_000 + i * 1_000);
            let resp = send(&mut app, &json);
            assert_eq!(resp["type"], "prediction");
        }
        let predictor = app.world().resource::<WaterPredictor>();
        assert_eq!(predictor.history_len(), 8);
        let latest = app.world().resource::<LatestReport>().0.as_ref().unwrap();
        assert_eq!(latest.trend, Trend::Increasing);
        assert_eq!(latest.timestamp, 1_007_000);
    }

    #[test]
    fn test_ingest_stamps_missing_timestamps() {
        let mut app = build_agent_app(3, false);
        let resp = send(&mut app, &ingest_json(210.0, 0));
        assert!(resp["report"]["timestamp"].as_u64().unwrap() > 0);
    }

    #[test]
    fn test_ingest_rejects_out_of_range_reading() {
        let mut app = build_agent_app(3, false);
        let json = r#"{"cmd":"ingest","readings":{
            "ro_reject":{"tds":9000,"temperature":25,"level":50,"flowRate":1},
            "rainwater":{"tds":50,"temperature":25,"level":50,"flowRate":1},
            "blended":{"tds":200,"temperature":25,"level":50,"flowRate":1}}}"#;
        let resp = send(&mut app, json);
        assert_eq!(resp["type"], "error");
        assert!(resp["message"].as_str().unwrap().contains("ro_reject"));
        assert_eq!(app.world().resource::<WaterPredictor>().history_len(), 0);
    }

    #[test]
    fn test_quit_says_goodbye() {
        let mut app = build_agent_app(3, false);
        assert_eq!(send(&mut app, r#"{"cmd":"quit"}"#)["type"], "goodbye");
    }
}
