// ---------------------------------------------------------------------------
// BlendingError: precondition violations at the plant boundary
// ---------------------------------------------------------------------------

use std::fmt;

use crate::tank::TankType;

/// Errors reported to callers that hand the plant malformed input.
///
/// The numeric core itself never fails; degenerate data is handled with
/// fallback values. These variants only surface from the explicit setters and
/// the ingestion validator.
#[derive(Debug, Clone, PartialEq)]
pub enum BlendingError {
    /// Blend shares were negative, non-finite, or summed to zero.
    InvalidBlendRatio { ro: f64, rain: f64 },
    /// A fill level that cannot be clamped (NaN or infinite).
    InvalidLevel(f64),
    /// A sensor value outside its physical bounds.
    InvalidReading {
        tank: TankType,
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl fmt::Display for BlendingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendingError::InvalidBlendRatio { ro, rain } => write!(
                f,
                "Invalid blend ratio: ro={ro}, rain={rain} (both must be finite, non-negative and sum above zero)"
            ),
            BlendingError::InvalidLevel(level) => write!(f, "Invalid tank level: {level}"),
            BlendingError::InvalidReading {
                tank,
                field,
                value,
                min,
                max,
            } => write!(
                f,
                "{}: {field} must be between {min} and {max} (got {value})",
                tank.key()
            ),
        }
    }
}

impl std::error::Error for BlendingError {}
