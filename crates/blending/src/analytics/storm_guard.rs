//! Storm Guard: a lagging rolling-window spike detector.
//!
//! Each point is judged only against the `window_size` points before it, so
//! the filter never looks ahead and is safe to run on a live stream.

/// Trailing window length used when none is configured.
pub const DEFAULT_WINDOW: usize = 5;
/// Deviation, in population standard deviations, beyond which a point is a spike.
pub const DEFAULT_THRESHOLD: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StormGuard {
    pub window_size: usize,
    pub threshold: f64,
}

impl Default for StormGuard {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Points that survived the filter, in their original order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilteredSeries {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// How many points were flagged and dropped.
    pub rejected: usize,
}

impl FilteredSeries {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

impl StormGuard {
    pub fn new(window_size: usize, threshold: f64) -> Self {
        Self {
            window_size,
            threshold,
        }
    }

    /// Same-length mask; `true` marks an anomaly.
    ///
    /// The first `window_size` points are never flagged. A point is flagged
    /// when the trailing window has non-zero spread and the point lies more
    /// than `threshold` standard deviations from the window mean.
    pub fn detect(&self, data: &[f64]) -> Vec<bool> {
        let w = self.window_size;
        if w == 0 {
            return vec![false; data.len()];
        }
        let n = w as f64;
        (0..data.len())
            .map(|i| {
                if i < w {
                    return false;
                }
                let window = &data[i - w..i];
                let mean = window.iter().sum::<f64>() / n;
                let variance = window.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                let std_dev = variance.sqrt();
                std_dev > 0.0 && (data[i] - mean).abs() > self.threshold * std_dev
            })
            .collect()
    }

    /// Drop the points of `(x, y)` whose `y` value is flagged.
    pub fn filter(&self, x: &[f64], y: &[f64]) -> FilteredSeries {
        let mask = self.detect(y);
        let mut out = FilteredSeries::default();
        for ((&xi, &yi), &flagged) in x.iter().zip(y).zip(&mask) {
            if flagged {
                out.rejected += 1;
            } else {
                out.x.push(xi);
                out.y.push(yi);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_obvious_spike() {
        let data = [100.0, 102.0, 101.0, 99.0, 100.0, 500.0, 101.0, 102.0];
        let mask = StormGuard::new(5, 2.0).detect(&data);
        assert_eq!(mask.len(), data.len());
        assert!(mask[5], "spike at index 5 should be flagged");
        assert!(!mask[0]);
        assert!(!mask[6], "point after the spike sees a wide window");
    }

    #[test]
    fn test_warmup_never_flagged() {
        let data = [1.0, 1000.0, -1000.0, 5.0, 0.0];
        let mask = StormGuard::default().detect(&data);
        assert!(mask.iter().all(|&m| !m));
    }

    #[test]
    fn test_flat_window_never_flags() {
        // Zero spread means there is no scale to judge deviation against.
        let data = [200.0, 200.0, 200.0, 200.0, 200.0, 999.0];
        let mask = StormGuard::default().detect(&data);
        assert!(!mask[5]);
    }

    #[test]
    fn test_uses_only_trailing_points() {
        let base = [10.0, 11.0, 10.0, 11.0, 10.0, 30.0];
        let mut extended = base.to_vec();
        extended.extend([30.0, 30.0, 30.0]);
        let a = StormGuard::default().detect(&base);
        let b = StormGuard::default().detect(&extended);
        assert_eq!(a[..], b[..base.len()]);
    }

    #[test]
    fn test_zero_window_flags_nothing() {
        let mask = StormGuard::new(0, 2.5).detect(&[1.0, 2.0, 300.0]);
        assert_eq!(mask, vec![false, false, false]);
    }

    #[test]
    fn test_filter_drops_flagged_pairs() {
        let y = [100.0, 102.0, 101.0, 99.0, 100.0, 500.0, 101.0, 102.0];
        let x: Vec<f64> = (0..y.len()).map(|i| i as f64 * 2.0).collect();
        let filtered = StormGuard::new(5, 2.0).filter(&x, &y);
        assert_eq!(filtered.rejected, 1);
        assert_eq!(filtered.len(), 7);
        assert!(!filtered.y.contains(&500.0));
        assert!(!filtered.x.contains(&10.0));
    }
}
