/// Seed used when a session is created or reset without an explicit one.
pub const DEFAULT_SEED: u64 = 12345;

/// Combined outflow of both source tanks at full valve opening (L/min).
pub const BASE_FLOW_RATE: f64 = 2.0;

/// Source tanks at or below this level (%) stop feeding the blend.
pub const MIN_SOURCE_LEVEL: f64 = 5.0;
/// Blended tank at or above this level (%) stops accepting inflow.
pub const MAX_BLENDED_LEVEL: f64 = 95.0;

/// Level drop (%) of a source tank per step, scaled by its blend share.
pub const SOURCE_LEVEL_DELTA: f64 = 0.1;
/// Level rise (%) of the blended tank per flowing step.
pub const BLENDED_LEVEL_DELTA: f64 = 0.05;

/// Multiplicative noise applied to the mixed TDS.
pub const MIX_TDS_NOISE: f64 = 0.03;
/// Multiplicative noise applied to the mixed temperature.
pub const MIX_TEMP_NOISE: f64 = 0.02;
/// Multiplicative noise applied to every flow-rate reading.
pub const FLOW_NOISE: f64 = 0.05;

/// Reference cadence of the external scheduler (seconds per step).
pub const STEP_INTERVAL_SECS: f64 = 2.0;
pub const STEP_INTERVAL_MS: u64 = 2_000;

/// Number of step readings a session remembers.
pub const SIMULATION_HISTORY_CAP: usize = 1_000;
/// Upper bound on steps produced by one `generate_time_series` call.
pub const MAX_GENERATED_STEPS: usize = 1_000;

/// Initial and fallback RO share of the blend.
pub const DEFAULT_RO_RATIO: f64 = 0.3;
pub const DEFAULT_RAIN_RATIO: f64 = 0.7;

// Sensor validation bounds for externally ingested readings.
pub const SENSOR_TDS_RANGE: (f64, f64) = (0.0, 5_000.0);
pub const SENSOR_TEMP_RANGE: (f64, f64) = (-10.0, 60.0);
pub const SENSOR_LEVEL_RANGE: (f64, f64) = (0.0, 100.0);
pub const SENSOR_FLOW_RANGE: (f64, f64) = (0.0, 100.0);

/// Label stamped on every prediction report.
pub const MODEL_NAME: &str = "Random Rain Forest v1.0";

// -----------------------------------------------------------------------------
// Prediction
// -----------------------------------------------------------------------------

/// Readings kept per tank by the predictor.
pub const PREDICTOR_HISTORY_SIZE: usize = 60;
/// Target band for the blended tank (ppm). Its midpoint is the optimal TDS.
pub const TARGET_TDS_MIN: f64 = 150.0;
pub const TARGET_TDS_MAX: f64 = 300.0;
/// How far ahead the forest forecasts (seconds past the newest sample).
pub const PREDICTION_HORIZON_SECS: f64 = 60.0;
/// RMSE at which the confidence mapping reaches zero before clamping.
pub const CONFIDENCE_SCALE: f64 = 100.0;
/// RMSE above which the report raises the high-variance storm alert.
pub const HIGH_VARIANCE_RMSE: f64 = 20.0;
/// An optimal blend counts as achievable within this many ppm of target.
pub const ACHIEVABLE_TOLERANCE: f64 = 20.0;
pub const EMA_ALPHA: f64 = 0.15;
pub const DEFAULT_BOOTSTRAP_SEED: u64 = 42;

/// Fixed confidences for the degenerate report paths.
pub const COLD_START_CONFIDENCE: f64 = 0.1;
pub const UNSTABLE_CONFIDENCE: f64 = 0.2;

/// Trend slopes (ppm/s) flatter than this never reach a target.
pub const MIN_TARGET_SLOPE: f64 = 0.01;
