use serde::{Deserialize, Serialize};

use crate::analytics::Trend;
use crate::tank::BlendRatio;

use super::blend::OptimalBlend;

/// Sensor-noise flag derived from the forest's fit error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StormAlert {
    #[serde(rename = "Stable")]
    Stable,
    #[serde(rename = "High variance detected - sensor noise likely.")]
    HighVariance,
}

impl StormAlert {
    pub fn message(self) -> &'static str {
        match self {
            StormAlert::Stable => "Stable",
            StormAlert::HighVariance => "High variance detected - sensor noise likely.",
        }
    }
}

/// Instant mix estimate with EMA smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlendEstimate {
    #[serde(rename = "mixedTDS")]
    pub mixed_tds: f64,
    #[serde(rename = "smoothedTDS")]
    pub smoothed_tds: f64,
    /// Grows with the amount of blended history seen.
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentState {
    #[serde(rename = "blendedTDS")]
    pub blended_tds: f64,
    /// Blended TDS inside the target band.
    pub is_optimal: bool,
}

/// One forecast. Built fresh on every call and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    /// Timestamp of the blended reading the report was built from (epoch ms).
    pub timestamp: u64,
    pub model: String,
    #[serde(rename = "predictedTDS")]
    pub predicted_tds: f64,
    pub trend: Trend,
    pub confidence: f64,
    pub rmse: f64,
    pub optimal_blend_ratio: BlendRatio,
    pub storm_alert: StormAlert,
    pub current_state: CurrentState,
    pub blend_estimate: BlendEstimate,
    pub optimal_blend: OptimalBlend,
    /// Seconds until the trend line crosses the optimal TDS, if it ever does.
    pub seconds_to_optimal: Option<f64>,
    /// Blended-history points Storm Guard excluded from this fit.
    pub rejected_points: usize,
    /// Blended-history length at report time.
    pub samples: usize,
}
