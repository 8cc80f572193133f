//! Least-squares trend line and its direction label.

use serde::{Deserialize, Serialize};

/// Slopes within `±SLOPE_THRESHOLD` (ppm per second) count as stable.
pub const SLOPE_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinearRegression {
    pub slope: f64,
    pub intercept: f64,
    trained: bool,
}

impl LinearRegression {
    /// Ordinary least squares over parallel slices. Fewer than two points
    /// leaves the model untrained; a degenerate `x` (zero denominator) yields
    /// a flat line through the mean of `y`.
    pub fn fit(&mut self, x: &[f64], y: &[f64]) {
        let n = x.len().min(y.len());
        if n < 2 {
            *self = Self::default();
            return;
        }
        let (x, y) = (&x[..n], &y[..n]);
        let nf = n as f64;
        let sum_x: f64 = x.iter().sum();
        let sum_y: f64 = y.iter().sum();
        let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();
        let sum_xx: f64 = x.iter().map(|a| a * a).sum();

        let denominator = nf * sum_xx - sum_x * sum_x;
        if denominator == 0.0 {
            self.slope = 0.0;
            self.intercept = sum_y / nf;
        } else {
            self.slope = (nf * sum_xy - sum_x * sum_y) / denominator;
            self.intercept = (sum_y - self.slope * sum_x) / nf;
        }
        self.trained = true;
    }

    pub fn is_trained(&self) -> bool {
        self.trained
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn trend(&self) -> Trend {
        if self.trained {
            Trend::from_slope(self.slope)
        } else {
            Trend::Learning
        }
    }
}

/// Direction of the TDS series as reported to the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    /// Not enough history yet.
    Learning,
    /// Too few points survived spike filtering.
    Unstable,
}

impl Trend {
    pub fn from_slope(slope: f64) -> Self {
        if slope > SLOPE_THRESHOLD {
            Trend::Increasing
        } else if slope < -SLOPE_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}
