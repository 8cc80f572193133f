use serde::{Deserialize, Serialize};

use crate::config::{ACHIEVABLE_TOLERANCE, DEFAULT_RO_RATIO, MIN_TARGET_SLOPE};
use crate::tank::{round_to, BlendRatio};

/// Blend ratio that steers the blended tank toward a target TDS.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimalBlend {
    pub ratio: BlendRatio,
    #[serde(rename = "targetTDS")]
    pub target_tds: f64,
    /// TDS the ratio would produce from the current sources.
    #[serde(rename = "achievedTDS")]
    pub achieved_tds: f64,
    pub achievable: bool,
}

/// Solve `target = ro_tds * x + rain_tds * (1 - x)` for the RO share `x`,
/// clamped to `[0, 1]`.
///
/// Equal source TDS cannot be steered by blending; the default 0.3 / 0.7
/// ratio is returned instead.
pub fn calculate_optimal_blend(ro_tds: f64, rain_tds: f64, target_tds: f64) -> OptimalBlend {
    let spread = ro_tds - rain_tds;
    let ratio = if spread.abs() < f64::EPSILON {
        BlendRatio::from_ro(DEFAULT_RO_RATIO)
    } else {
        BlendRatio::from_ro((target_tds - rain_tds) / spread)
    };
    let achieved_tds = ratio.mix(ro_tds, rain_tds);
    OptimalBlend {
        ratio,
        target_tds,
        achieved_tds: round_to(achieved_tds, 1),
        achievable: (achieved_tds - target_tds).abs() < ACHIEVABLE_TOLERANCE,
    }
}

/// Seconds until a series moving at `slope` ppm/s reaches `target`.
///
/// `None` when the slope is too flat or points away from the target.
pub fn time_to_target(current: f64, target: f64, slope: f64) -> Option<f64> {
    if !slope.is_finite() || slope.abs() < MIN_TARGET_SLOPE {
        return None;
    }
    let secs = (target - current) / slope;
    (secs >= 0.0).then_some(secs)
}
