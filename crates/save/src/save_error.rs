// ---------------------------------------------------------------------------
// ModelFileError: error types for model save/load
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors that can occur while writing or reading a model file.
#[derive(Debug)]
pub enum ModelFileError {
    /// I/O error (file not found, permission denied, disk full, etc.)
    Io(std::io::Error),
    /// Bitcode encoding failed.
    Encode(String),
    /// Payload could not be decompressed or decoded, or its node links are
    /// malformed.
    Decode(String),
    /// JSON document could not be parsed or written.
    Json(serde_json::Error),
    /// Header or model version is newer than this build supports.
    VersionMismatch { expected_max: u32, found: u32 },
    /// Payload checksum does not match the header.
    ChecksumMismatch { expected: u32, found: u32 },
    /// File ends before the header does.
    Truncated { len: usize, needed: usize },
    /// Refused to persist a forest that was never fitted.
    UntrainedForest,
}

impl fmt::Display for ModelFileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFileError::Io(e) => write!(f, "I/O error: {e}"),
            ModelFileError::Encode(msg) => write!(f, "Encoding error: {msg}"),
            ModelFileError::Decode(msg) => write!(f, "Decoding error: {msg}"),
            ModelFileError::Json(e) => write!(f, "JSON error: {e}"),
            ModelFileError::VersionMismatch {
                expected_max,
                found,
            } => write!(
                f,
                "Version mismatch: model file is v{found}, but this build only supports up to v{expected_max}"
            ),
            ModelFileError::ChecksumMismatch { expected, found } => write!(
                f,
                "Model file is corrupted: checksum mismatch (expected {expected:#010X}, got {found:#010X})"
            ),
            ModelFileError::Truncated { len, needed } => write!(
                f,
                "Model file is too short ({len} bytes, need at least {needed} for header)"
            ),
            ModelFileError::UntrainedForest => write!(f, "Forest is not trained"),
        }
    }
}

impl std::error::Error for ModelFileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelFileError::Io(e) => Some(e),
            ModelFileError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ModelFileError {
    fn from(e: std::io::Error) -> Self {
        ModelFileError::Io(e)
    }
}

impl From<bitcode::Error> for ModelFileError {
    fn from(e: bitcode::Error) -> Self {
        ModelFileError::Decode(e.to_string())
    }
}

impl From<serde_json::Error> for ModelFileError {
    fn from(e: serde_json::Error) -> Self {
        ModelFileError::Json(e)
    }
}
