//! Persistence for trained Random Rain Forest models.
//!
//! Two formats share one `ModelFile`: the nested-node JSON document consumed
//! by dashboards, and a compact binary file (RAIN header + bitcode payload)
//! for fast reload. Both are written atomically.

pub mod atomic_write;
pub mod file_header;
pub mod model_codec;
pub mod model_types;
pub mod save_error;

use std::path::Path;

use bevy::log::{info, warn};

pub use atomic_write::atomic_write;
pub use model_codec::{decode_model, encode_model, MODEL_FORMAT_VERSION};
pub use model_types::{ModelFile, ModelMetrics, MODEL_VERSION};
pub use save_error::ModelFileError;

/// Serialize to the pretty-printed JSON document.
///
/// # Errors
///
/// `UntrainedForest` for an unfitted forest, `Json` if serialization fails.
pub fn to_json(model: &ModelFile) -> Result<String, ModelFileError> {
    if !model.forest.is_trained() {
        return Err(ModelFileError::UntrainedForest);
    }
    Ok(serde_json::to_string_pretty(model)?)
}

/// Parse the JSON document.
///
/// # Errors
///
/// `Json` for malformed input, `UntrainedForest` if it holds no trained forest.
pub fn from_json(text: &str) -> Result<ModelFile, ModelFileError> {
    let model: ModelFile = serde_json::from_str(text)?;
    if !model.forest.is_trained() || model.forest.trees().is_empty() {
        return Err(ModelFileError::UntrainedForest);
    }
    Ok(model)
}

/// Write `model` to `path` as a binary model file.
pub fn save_model(path: &Path, model: &ModelFile, compress: bool) -> Result<(), ModelFileError> {
    let bytes = encode_model(model, compress)?;
    atomic_write(path, &bytes)?;
    info!(
        "Saved {}-tree model to {} ({} bytes{})",
        model.forest.num_trees,
        path.display(),
        bytes.len(),
        if compress { ", lz4" } else { "" }
    );
    Ok(())
}

/// Write `model` to `path` as JSON.
pub fn save_model_json(path: &Path, model: &ModelFile) -> Result<(), ModelFileError> {
    let text = to_json(model)?;
    atomic_write(path, text.as_bytes())?;
    info!("Saved model JSON to {}", path.display());
    Ok(())
}

/// Load a model file, accepting either format: files starting with the RAIN
/// magic are decoded as binary, everything else is parsed as JSON.
pub fn load_model(path: &Path) -> Result<ModelFile, ModelFileError> {
    let bytes = std::fs::read(path)?;
    let result = if bytes.starts_with(&file_header::MAGIC) {
        decode_model(&bytes)
    } else {
        std::str::from_utf8(&bytes)
            .map_err(|e| ModelFileError::Decode(format!("not UTF-8 JSON: {e}")))
            .and_then(from_json)
    };
    match &result {
        Ok(model) => info!(
            "Loaded model v{} from {} ({} trees, rmse {})",
            model.version,
            path.display(),
            model.forest.num_trees,
            model.metrics.rmse
        ),
        Err(e) => warn!("Failed to load model from {}: {e}", path.display()),
    }
    result
}
