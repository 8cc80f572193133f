//! Prediction orchestrator: rolling history, Storm Guard, forest, trend and
//! blend-ratio recommendation combined into one report.

pub mod blend;
pub mod report;
pub mod water_predictor;


pub use blend::{calculate_optimal_blend, time_to_target, OptimalBlend};
pub use report::{BlendEstimate, CurrentState, PredictionReport, StormAlert};
pub use water_predictor::{PredictorConfig, WaterPredictor};
