//! Random Rain Forest: a bagged ensemble of Raindrop Trees.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::raindrop_tree::{RaindropTree, DEFAULT_MAX_DEPTH};

/// Default ensemble size for live forecasting.
pub const DEFAULT_NUM_TREES: usize = 8;
/// Fewer samples than this and `fit` refuses to train.
pub const MIN_TRAINING_SAMPLES: usize = 5;
/// RMSE reported by an untrained forest.
pub const UNTRAINED_RMSE: f64 = 100.0;

const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RandomRainForest {
    pub num_trees: usize,
    #[serde(rename = "forest")]
    trees: Vec<RaindropTree>,
    is_trained: bool,
    #[serde(skip, default = "default_tree_depth")]
    tree_depth: usize,
}

fn default_tree_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for RandomRainForest {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_TREES, DEFAULT_MAX_DEPTH)
    }
}

impl RandomRainForest {
    pub fn new(num_trees: usize, tree_depth: usize) -> Self {
        Self {
            num_trees,
            trees: Vec::new(),
            is_trained: false,
            tree_depth,
        }
    }

    /// Rebuild a trained forest from already-fitted trees (model reload).
    pub fn from_trees(trees: Vec<RaindropTree>) -> Self {
        let tree_depth = trees
            .first()
            .map_or(DEFAULT_MAX_DEPTH, |tree| tree.max_depth);
        Self {
            num_trees: trees.len(),
            is_trained: !trees.is_empty(),
            trees,
            tree_depth,
        }
    }

    pub fn is_trained(&self) -> bool {
        self.is_trained
    }

    pub fn trees(&self) -> &[RaindropTree] {
        &self.trees
    }

    /// Train `num_trees` trees, each on a bootstrap resample of `(x, y)`.
    ///
    /// Returns `false` and leaves the previous fit untouched when the series
    /// lengths differ or there are fewer than `MIN_TRAINING_SAMPLES` points.
    /// Each resample is re-sorted by `x` so the trees only split along time.
    pub fn fit<R: Rng + ?Sized>(&mut self, x: &[f64], y: &[f64], rng: &mut R) -> bool {
        let n = x.len();
        if n != y.len() || n < MIN_TRAINING_SAMPLES {
            return false;
        }

        let mut trees = Vec::with_capacity(self.num_trees);
        let mut indices = Vec::with_capacity(n);
        let mut sample_x = Vec::with_capacity(n);
        let mut sample_y = Vec::with_capacity(n);
        for _ in 0..self.num_trees {
            indices.clear();
            indices.extend((0..n).map(|_| rng.gen_range(0..n)));
            indices.sort_by(|&a, &b| x[a].total_cmp(&x[b]).then(a.cmp(&b)));

            sample_x.clear();
            sample_y.clear();
            sample_x.extend(indices.iter().map(|&i| x[i]));
            sample_y.extend(indices.iter().map(|&i| y[i]));

            let mut tree = RaindropTree::new(self.tree_depth);
            tree.fit(&sample_x, &sample_y);
            trees.push(tree);
        }

        self.trees = trees;
        self.is_trained = true;
        true
    }

    /// Mean of all tree predictions; 0 when untrained.
    pub fn predict(&self, value: f64) -> f64 {
        if !self.is_trained || self.trees.is_empty() {
            return 0.0;
        }
        let total: f64 = self.trees.iter().map(|tree| tree.predict(value)).sum();
        total / self.trees.len() as f64
    }

    /// Root-mean-square error of the ensemble over `(x, y)`.
    /// `UNTRAINED_RMSE` when untrained, 0 for an empty series.
    pub fn rmse(&self, x: &[f64], y: &[f64]) -> f64 {
        if !self.is_trained {
            return UNTRAINED_RMSE;
        }
        let n = x.len().min(y.len());
        if n == 0 {
            return 0.0;
        }
        let sum: f64 = x
            .iter()
            .zip(y)
            .map(|(&xi, &yi)| (self.predict(xi) - yi).powi(2))
            .sum();
        (sum / n as f64).sqrt()
    }
}

/// Map an RMSE onto a confidence in `[0.1, 0.95]`; `scale` is the RMSE at
/// which confidence would reach zero before clamping.
pub fn confidence_from_rmse(rmse: f64, scale: f64) -> f64 {
    if !rmse.is_finite() || scale <= 0.0 {
        return MIN_CONFIDENCE;
    }
    (1.0 - rmse / scale).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ramp(n: usize) -> (Vec<f64>, Vec<f64>) {
        let x: Vec<f64> = (0..n).map(|i| i as f64 * 2.0).collect();
        let y: Vec<f64> = (0..n).map(|i| 200.0 + i as f64 * 5.0).collect();
        (x, y)
    }

    #[test]
    fn test_refuses_small_or_mismatched_input() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut forest = RandomRainForest::default();
        assert!(!forest.fit(&[0.0, 1.0, 2.0, 3.0], &[1.0, 2.0, 3.0, 4.0], &mut rng));
        assert!(!forest.fit(&[0.0; 6], &[1.0; 5], &mut rng));
        assert!(!forest.is_trained());
        assert_eq!(forest.predict(10.0), 0.0);
        assert_eq!(forest.rmse(&[0.0], &[5.0]), UNTRAINED_RMSE);
    }

    #[test]
    fn test_fit_grows_configured_tree_count() {
        let (x, y) = ramp(20);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut forest = RandomRainForest::new(12, 3);
        assert!(forest.fit(&x, &y, &mut rng));
        assert_eq!(forest.trees().len(), 12);
        for tree in forest.trees() {
            assert!(tree.root().is_some_and(|root| root.depth() <= 3));
        }
    }

    #[test]
    fn test_prediction_within_target_range() {
        let (x, y) = ramp(30);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut forest = RandomRainForest::default();
        forest.fit(&x, &y, &mut rng);
        for probe in [-10.0, 0.0, 15.0, 58.0, 500.0] {
            let p = forest.predict(probe);
            assert!((200.0..=345.0).contains(&p), "prediction {p} at {probe}");
        }
        // Extrapolation follows the last step of the series.
        assert!(forest.predict(500.0) > forest.predict(0.0));
    }

    #[test]
    fn test_same_seed_same_forest() {
        let (x, y) = ramp(25);
        let mut a = RandomRainForest::default();
        let mut b = RandomRainForest::default();
        a.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(99));
        b.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn test_rmse_of_constant_series_is_zero() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y = vec![180.0; 10];
        let mut forest = RandomRainForest::default();
        forest.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(5));
        assert!(forest.rmse(&x, &y).abs() < 1e-9);
        assert_eq!(forest.rmse(&[], &[]), 0.0);
    }

    #[test]
    fn test_confidence_clamps() {
        assert_eq!(confidence_from_rmse(0.0, 100.0), 0.95);
        assert_eq!(confidence_from_rmse(250.0, 100.0), 0.1);
        assert!((confidence_from_rmse(40.0, 100.0) - 0.6).abs() < 1e-12);
        assert_eq!(confidence_from_rmse(f64::NAN, 100.0), 0.1);
    }

    #[test]
    fn test_from_trees_is_trained() {
        let (x, y) = ramp(10);
        let mut fitted = RandomRainForest::new(3, 2);
        fitted.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(11));
        let rebuilt = RandomRainForest::from_trees(fitted.trees().to_vec());
        assert!(rebuilt.is_trained());
        assert_eq!(rebuilt.num_trees, 3);
        assert_eq!(rebuilt.predict(4.0), fitted.predict(4.0));
    }

    #[test]
    fn test_json_shape() {
        let (x, y) = ramp(8);
        let mut forest = RandomRainForest::new(2, 1);
        forest.fit(&x, &y, &mut ChaCha8Rng::seed_from_u64(2));
        let json = serde_json::to_value(&forest).unwrap();
        assert_eq!(json["numTrees"], 2);
        assert_eq!(json["isTrained"], true);
        assert_eq!(json["forest"].as_array().map(Vec::len), Some(2));
        assert_eq!(json["forest"][0]["maxDepth"], 1);
    }
}
