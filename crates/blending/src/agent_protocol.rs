//! Agent text protocol types for the `--agent` headless mode.
//!
//! Newline-delimited JSON on stdin/stdout. These types live in the core
//! crate so they can be unit-tested without the binary; the I/O loop lives
//! in `crates/app/src/agent_mode.rs`.

use serde::{Deserialize, Serialize};

use crate::predictor::PredictionReport;
use crate::simulation::SimulationReading;
use crate::tank::{BlendRatio, PerTank, Reading, TankType};

// ---------------------------------------------------------------------------
// Commands (stdin → plant)
// ---------------------------------------------------------------------------

/// Blend shares as sent on the wire, before normalization.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RawBlendRatio {
    pub ro: f64,
    pub rain: f64,
}

/// A single command. The `cmd` field is the discriminator tag.
#[derive(Debug, Deserialize)]
#[serde(tag = "cmd")]
pub enum AgentCommand {
    /// Advance the simulation by `ticks` steps (default 1).
    #[serde(rename = "step")]
    Step {
        #[serde(default = "one")]
        ticks: u64,
    },

    /// Current snapshot without stepping.
    #[serde(rename = "current")]
    Current,

    /// The most recent `limit` step readings.
    #[serde(rename = "history")]
    History {
        #[serde(default = "default_history_limit")]
        limit: usize,
    },

    /// Re-seed the plant and clear the predictor. Omitting `seed` reuses the
    /// session's seed.
    #[serde(rename = "reset")]
    Reset {
        #[serde(default)]
        seed: Option<u64>,
    },

    #[serde(rename = "blend")]
    Blend { ro: f64, rain: f64 },

    #[serde(rename = "fill")]
    Fill { tank: TankType, level: f64 },

    /// Fresh series of `duration / interval` readings from a scratch copy of
    /// the session.
    #[serde(rename = "generate")]
    Generate {
        #[serde(default = "default_duration")]
        duration: u64,
        #[serde(default = "default_interval")]
        interval: u64,
    },

    /// Latest prediction report, building one if none exists yet.
    #[serde(rename = "predict")]
    Predict,

    /// Externally measured readings, validated then fed to the predictor.
    #[serde(rename = "ingest")]
    Ingest {
        readings: PerTank<Reading>,
        #[serde(default)]
        blend_ratio: Option<RawBlendRatio>,
    },

    #[serde(rename = "quit")]
    Quit,
}

fn one() -> u64 {
    1
}

fn default_history_limit() -> usize {
    50
}

fn default_duration() -> u64 {
    3_600
}

fn default_interval() -> u64 {
    2
}

// ---------------------------------------------------------------------------
// Responses (plant → stdout)
// ---------------------------------------------------------------------------

/// Every response includes the protocol version and a tagged payload.
#[derive(Debug, Serialize)]
pub struct AgentResponse {
    pub protocol_version: u32,
    #[serde(flatten)]
    pub payload: ResponsePayload,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ResponsePayload {
    #[serde(rename = "ready")]
    Ready,

    #[serde(rename = "reading")]
    Reading { reading: SimulationReading },

    #[serde(rename = "history")]
    History { readings: Vec<SimulationReading> },

    #[serde(rename = "series")]
    Series { readings: Vec<SimulationReading> },

    #[serde(rename = "blend_ratio")]
    BlendRatio { blend_ratio: BlendRatio },

    #[serde(rename = "tank_level")]
    TankLevel { tank: TankType, level: f64 },

    #[serde(rename = "prediction")]
    Prediction { report: Box<PredictionReport> },

    #[serde(rename = "ok")]
    Ok,

    #[serde(rename = "error")]
    Error { message: String },

    #[serde(rename = "goodbye")]
    Goodbye,
}

/// Bump when the command/response schema changes.
pub const PROTOCOL_VERSION: u32 = 1;

pub fn make_response(payload: ResponsePayload) -> AgentResponse {
    AgentResponse {
        protocol_version: PROTOCOL_VERSION,
        payload,
    }
}

pub fn error_response(message: impl Into<String>) -> AgentResponse {
    make_response(ResponsePayload::Error {
        message: message.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_step_defaults_to_one_tick() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"step"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Step { ticks: 1 }));
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"step","ticks":30}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Step { ticks: 30 }));
    }

    #[test]
    fn deserialize_fill_uses_tank_keys() {
        let json = r#"{"cmd":"fill","tank":"ro_reject","level":80}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::Fill { tank, level } = cmd {
            assert_eq!(tank, TankType::RoReject);
            assert_eq!(level, 80.0);
        } else {
            panic!("expected Fill");
        }
        let bad = r#"{"cmd":"fill","tank":"sea","level":80}"#;
        assert!(serde_json::from_str::<AgentCommand>(bad).is_err());
    }

    #[test]
    fn deserialize_reset_with_and_without_seed() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"reset","seed":7}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Reset { seed: Some(7) }));
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"reset"}"#).unwrap();
        assert!(matches!(cmd, AgentCommand::Reset { seed: None }));
    }

    #[test]
    fn deserialize_ingest() {
        let json = r#"{"cmd":"ingest","readings":{
            "ro_reject":{"tds":1100,"temperature":30,"level":70,"flowRate":0.6},
            "rainwater":{"tds":40,"temperature":24,"level":55,"flowRate":1.4},
            "blended":{"timestamp":1000,"tds":240,"temperature":26,"level":52,"flowRate":2.0}
        },"blend_ratio":{"ro":3,"rain":7}}"#;
        let cmd: AgentCommand = serde_json::from_str(json).unwrap();
        if let AgentCommand::Ingest {
            readings,
            blend_ratio,
        } = cmd
        {
            assert_eq!(readings.ro_reject.timestamp_ms, 0);
            assert_eq!(readings.blended.timestamp_ms, 1000);
            assert_eq!(readings.rainwater.flow_rate, 1.4);
            assert_eq!(blend_ratio, Some(RawBlendRatio { ro: 3.0, rain: 7.0 }));
        } else {
            panic!("expected Ingest");
        }
    }

    #[test]
    fn deserialize_generate_defaults() {
        let cmd: AgentCommand = serde_json::from_str(r#"{"cmd":"generate"}"#).unwrap();
        assert!(matches!(
            cmd,
            AgentCommand::Generate {
                duration: 3_600,
                interval: 2
            }
        ));
    }

    #[test]
    fn serialize_tagged_responses() {
        let json = serde_json::to_string(&make_response(ResponsePayload::Ready)).unwrap();
        assert!(json.contains("\"protocol_version\":1"));
        assert!(json.contains("\"type\":\"ready\""));

        let json = serde_json::to_string(&make_response(ResponsePayload::TankLevel {
            tank: TankType::Blended,
            level: 42.0,
        }))
        .unwrap();
        assert!(json.contains("\"type\":\"tank_level\""));
        assert!(json.contains("\"tank\":\"blended\""));

        let json = serde_json::to_string(&error_response("bad input")).unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("bad input"));
    }

    #[test]
    fn unknown_or_malformed_commands_fail() {
        assert!(serde_json::from_str::<AgentCommand>(r#"{"cmd":"observe"}"#).is_err());
        assert!(serde_json::from_str::<AgentCommand>(r#"{not json"#).is_err());
    }
}
