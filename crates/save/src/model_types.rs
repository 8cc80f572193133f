use serde::{Deserialize, Serialize};

use blending::analytics::RandomRainForest;

use crate::save_error::ModelFileError;

/// Version string stamped on every model this build writes.
pub const MODEL_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Training RMSE over the filtered series, two decimals.
    pub rmse: f64,
    /// Points that survived Storm Guard and were used for fitting.
    pub samples: u64,
}

/// A trained forest with its provenance, as persisted to disk.
///
/// JSON layout: `{version, trainedAt, metrics: {rmse, samples}, forest}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFile {
    pub version: String,
    /// Unix epoch milliseconds.
    pub trained_at: u64,
    pub metrics: ModelMetrics,
    pub forest: RandomRainForest,
}

impl ModelFile {
    /// # Errors
    ///
    /// `UntrainedForest` if `forest` was never fitted.
    pub fn new(
        forest: RandomRainForest,
        metrics: ModelMetrics,
        trained_at: u64,
    ) -> Result<Self, ModelFileError> {
        if !forest.is_trained() {
            return Err(ModelFileError::UntrainedForest);
        }
        Ok(Self {
            version: MODEL_VERSION.to_string(),
            trained_at,
            metrics,
            forest,
        })
    }
}
