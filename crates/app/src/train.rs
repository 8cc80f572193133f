//! `--train`: fit a deployment forest on a synthetic TDS series and save it.
//!
//! The series has three regimes at 1 s spacing: 100 stable points near 200
//! ppm, 100 points rising 0.5 ppm/s, and 50 points near 250 ppm with an 800
//! ppm spike every tenth point for Storm Guard to reject.

use std::path::Path;

use bevy::log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use blending::analytics::{RandomRainForest, StormGuard};
use blending::tank::round_to;
use save::{ModelFile, ModelFileError, ModelMetrics};

/// Trees in the deployment forest; larger than the live predictor's.
pub const TRAINING_TREES: usize = 12;
pub const TRAINING_TREE_DEPTH: usize = 3;

const SPIKE_TDS: f64 = 800.0;

/// `(x, y)` with `x` in seconds from the first sample.
pub fn synthetic_series<R: Rng + ?Sized>(rng: &mut R) -> (Vec<f64>, Vec<f64>) {
    let mut y = Vec::with_capacity(250);
    for _ in 0..100 {
        y.push(200.0 + rng.gen::<f64>() * 5.0);
    }
    for i in 100..200 {
        y.push(205.0 + (i - 100) as f64 * 0.5 + rng.gen::<f64>() * 5.0);
    }
    for i in 200..250 {
        let tds = 250.0 + rng.gen::<f64>() * 5.0;
        y.push(if i % 10 == 0 { SPIKE_TDS } else { tds });
    }
    let x = (0..y.len()).map(|i| i as f64).collect();
    (x, y)
}

/// Generate, filter, fit and package a model. `seed` drives both the
/// synthetic noise and the bootstrap.
pub fn train_model(seed: u64, trained_at: u64) -> Result<ModelFile, ModelFileError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (x, y) = synthetic_series(&mut rng);

    let filtered = StormGuard::default().filter(&x, &y);
    info!(
        "Storm Guard filtered {} of {} training points",
        filtered.rejected,
        x.len()
    );

    let mut forest = RandomRainForest::new(TRAINING_TREES, TRAINING_TREE_DEPTH);
    forest.fit(&filtered.x, &filtered.y, &mut rng);
    let rmse = forest.rmse(&filtered.x, &filtered.y);
    info!("Training complete, rmse {:.4}", rmse);

    ModelFile::new(
        forest,
        ModelMetrics {
            rmse: round_to(rmse, 2),
            samples: filtered.len() as u64,
        },
        trained_at,
    )
}

/// Train and write to `path`: JSON for a `.json` extension, lz4 binary
/// otherwise.
pub fn run_train(path: &Path, seed: u64, trained_at: u64) -> Result<(), ModelFileError> {
    let model = train_model(seed, trained_at)?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        save::save_model_json(path, &model)
    } else {
        save::save_model(path, &model, true)
    }
}
