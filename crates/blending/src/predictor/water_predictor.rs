use std::collections::VecDeque;

use bevy::log::{info, warn};
use bevy::prelude::Resource;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::analytics::forest::DEFAULT_NUM_TREES;
use crate::analytics::raindrop_tree::DEFAULT_MAX_DEPTH;
use crate::analytics::storm_guard::{DEFAULT_THRESHOLD, DEFAULT_WINDOW};
use crate::analytics::{
    confidence_from_rmse, Ema, LinearRegression, RandomRainForest, StormGuard, Trend,
    MIN_TRAINING_SAMPLES,
};
use crate::config::{
    COLD_START_CONFIDENCE, CONFIDENCE_SCALE, DEFAULT_BOOTSTRAP_SEED, EMA_ALPHA,
    HIGH_VARIANCE_RMSE, MODEL_NAME, PREDICTION_HORIZON_SECS, PREDICTOR_HISTORY_SIZE,
    TARGET_TDS_MAX, TARGET_TDS_MIN, UNSTABLE_CONFIDENCE,
};
use crate::tank::{round_to, BlendRatio, PerTank, Reading, ValueRange};

use super::blend::{calculate_optimal_blend, time_to_target};
use super::report::{BlendEstimate, CurrentState, PredictionReport, StormAlert};

// =============================================================================
// Configuration
// =============================================================================

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Readings kept per tank; the oldest is evicted when full.
    pub history_size: usize,
    pub target_tds: ValueRange,
    pub num_trees: usize,
    pub tree_depth: usize,
    pub horizon_secs: f64,
    pub confidence_scale: f64,
    pub storm_window: usize,
    pub storm_threshold: f64,
    pub ema_alpha: f64,
    /// Seed of the bootstrap sampler; fixes forest output for a given history.
    pub bootstrap_seed: u64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_size: PREDICTOR_HISTORY_SIZE,
            target_tds: ValueRange::new(TARGET_TDS_MIN, TARGET_TDS_MAX),
            num_trees: DEFAULT_NUM_TREES,
            tree_depth: DEFAULT_MAX_DEPTH,
            horizon_secs: PREDICTION_HORIZON_SECS,
            confidence_scale: CONFIDENCE_SCALE,
            storm_window: DEFAULT_WINDOW,
            storm_threshold: DEFAULT_THRESHOLD,
            ema_alpha: EMA_ALPHA,
            bootstrap_seed: DEFAULT_BOOTSTRAP_SEED,
        }
    }
}

impl PredictorConfig {
    /// Midpoint of the target band.
    pub fn optimal_tds(&self) -> f64 {
        self.target_tds.midpoint()
    }
}

// =============================================================================
// Predictor
// =============================================================================

/// Rolling per-tank history plus the models fitted over it.
///
/// Not shareable between concurrent callers: history, forest, sampler and EMA
/// are all mutated in place on every report.
#[derive(Resource, Debug, Clone)]
pub struct WaterPredictor {
    config: PredictorConfig,
    history: PerTank<VecDeque<Reading>>,
    forest: RandomRainForest,
    trend: LinearRegression,
    ema: Ema,
    rng: ChaCha8Rng,
}

impl Default for WaterPredictor {
    fn default() -> Self {
        Self::new(PredictorConfig::default())
    }
}

impl WaterPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self {
            history: PerTank::default(),
            forest: RandomRainForest::new(config.num_trees, config.tree_depth),
            trend: LinearRegression::default(),
            ema: Ema::new(config.ema_alpha),
            rng: ChaCha8Rng::seed_from_u64(config.bootstrap_seed),
            config,
        }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    pub fn forest(&self) -> &RandomRainForest {
        &self.forest
    }

    pub fn history_len(&self) -> usize {
        self.history.blended.len()
    }

    pub fn blended_history(&self) -> impl Iterator<Item = &Reading> {
        self.history.blended.iter()
    }

    /// Drop all history and fitted state and re-seed the bootstrap sampler.
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
        info!("Predictor reset");
    }

    fn record(&mut self, readings: &PerTank<Reading>) {
        let cap = self.config.history_size.max(1);
        let history = &mut self.history;
        for (queue, reading) in [
            (&mut history.ro_reject, readings.ro_reject),
            (&mut history.rainwater, readings.rainwater),
            (&mut history.blended, readings.blended),
        ] {
            while queue.len() >= cap {
                queue.pop_front();
            }
            queue.push_back(reading);
        }
    }

    /// Linear mix of the sources, smoothed by the EMA.
    pub fn predict_blended_tds(
        &mut self,
        ro_tds: f64,
        rain_tds: f64,
        ratio: BlendRatio,
    ) -> BlendEstimate {
        let mixed_tds = ratio.mix(ro_tds, rain_tds);
        let smoothed_tds = self.ema.update(mixed_tds);
        let confidence = match self.history_len() {
            n if n < 10 => 0.2,
            n if n < 30 => 0.5,
            _ => 0.85,
        };
        BlendEstimate {
            mixed_tds: round_to(mixed_tds, 1),
            smoothed_tds: round_to(smoothed_tds, 1),
            confidence,
        }
    }

    /// Record `readings`, refit the models over the blended history and
    /// assemble a report.
    ///
    /// Never fails: short or spike-ridden history yields a `learning` or
    /// `unstable` report carrying the last raw blended TDS.
    pub fn get_prediction_report(
        &mut self,
        readings: &PerTank<Reading>,
        blend_ratio: BlendRatio,
    ) -> PredictionReport {
        self.record(readings);

        let blended = readings.blended;
        let optimal_tds = self.config.optimal_tds();
        let blend_estimate =
            self.predict_blended_tds(readings.ro_reject.tds, readings.rainwater.tds, blend_ratio);
        let optimal_blend =
            calculate_optimal_blend(readings.ro_reject.tds, readings.rainwater.tds, optimal_tds);

        let samples = self.history.blended.len();
        let origin_ms = self
            .history
            .blended
            .front()
            .map_or(blended.timestamp_ms, |r| r.timestamp_ms);
        let x: Vec<f64> = self
            .history
            .blended
            .iter()
            .map(|r| r.timestamp_ms.saturating_sub(origin_ms) as f64 / 1000.0)
            .collect();
        let y: Vec<f64> = self.history.blended.iter().map(|r| r.tds).collect();

        let mut report = PredictionReport {
            timestamp: blended.timestamp_ms,
            model: MODEL_NAME.to_string(),
            predicted_tds: round_to(blended.tds, 1),
            trend: Trend::Learning,
            confidence: COLD_START_CONFIDENCE,
            rmse: 0.0,
            optimal_blend_ratio: optimal_blend.ratio,
            storm_alert: StormAlert::Stable,
            current_state: CurrentState {
                blended_tds: blended.tds,
                is_optimal: self.config.target_tds.contains(blended.tds),
            },
            blend_estimate,
            optimal_blend,
            seconds_to_optimal: None,
            rejected_points: 0,
            samples,
        };

        if samples < MIN_TRAINING_SAMPLES {
            return report;
        }

        let guard = StormGuard::new(self.config.storm_window, self.config.storm_threshold);
        let filtered = guard.filter(&x, &y);
        report.rejected_points = filtered.rejected;
        if filtered.rejected > 0 {
            warn!(
                "Storm Guard rejected {} of {} blended readings",
                filtered.rejected, samples
            );
        }

        if filtered.len() < MIN_TRAINING_SAMPLES {
            report.trend = Trend::Unstable;
            report.confidence = UNSTABLE_CONFIDENCE;
            report.storm_alert = StormAlert::HighVariance;
            return report;
        }

        self.forest.fit(&filtered.x, &filtered.y, &mut self.rng);
        self.trend.fit(&filtered.x, &filtered.y);

        let predicted = self
            .forest
            .predict(forecast_x(&x, self.config.horizon_secs));
        let rmse = self.forest.rmse(&filtered.x, &filtered.y);

        report.predicted_tds = round_to(predicted, 1);
        report.trend = self.trend.trend();
        report.rmse = round_to(rmse, 2);
        report.confidence = round_to(confidence_from_rmse(rmse, self.config.confidence_scale), 2);
        report.storm_alert = if rmse > HIGH_VARIANCE_RMSE {
            StormAlert::HighVariance
        } else {
            StormAlert::Stable
        };
        report.seconds_to_optimal = time_to_target(blended.tds, optimal_tds, self.trend.slope)
            .map(|secs| round_to(secs, 1));
        report
    }
}

/// Forecast input: the horizon past the newest recorded sample, whether or
/// not Storm Guard kept that sample.
pub(crate) fn forecast_x(x: &[f64], horizon_secs: f64) -> f64 {
    x.last().copied().unwrap_or(0.0) + horizon_secs
}
