//! Raindrop Tree: a shallow regression tree over a time-ordered scalar input.
//!
//! Splits are only ever made between neighbouring positions of the (sorted)
//! training input, so the fitted tree is a step function of time rather than
//! a general CART tree.

use serde::{Deserialize, Serialize};

/// Depth used by the forest for every tree it grows.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Nodes with fewer samples than this become leaves.
const MIN_SPLIT_SAMPLES: usize = 3;

/// A fitted node. Children are owned by their parent, so a whole tree is
/// dropped as a unit.
///
/// Serialized untagged, as `{"value"}` for leaves and
/// `{"threshold", "left", "right"}` for internal nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Internal {
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        value: f64,
    },
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Longest root-to-leaf edge count.
    pub fn depth(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 0,
            TreeNode::Internal { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            TreeNode::Leaf { .. } => 1,
            TreeNode::Internal { left, right, .. } => left.leaf_count() + right.leaf_count(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaindropTree {
    pub max_depth: usize,
    #[serde(rename = "tree")]
    root: Option<TreeNode>,
}

impl Default for RaindropTree {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

impl RaindropTree {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            root: None,
        }
    }

    /// Rebuild a tree from an already-fitted root (model reload).
    pub fn from_root(max_depth: usize, root: TreeNode) -> Self {
        Self {
            max_depth,
            root: Some(root),
        }
    }

    pub fn root(&self) -> Option<&TreeNode> {
        self.root.as_ref()
    }

    /// Fit on parallel slices, `x` sorted ascending. Replaces any previous fit.
    /// An empty input leaves the tree unfitted.
    pub fn fit(&mut self, x: &[f64], y: &[f64]) {
        let n = x.len().min(y.len());
        self.root = if n == 0 {
            None
        } else {
            Some(self.build(&x[..n], &y[..n], 0))
        };
    }

    fn build(&self, x: &[f64], y: &[f64], depth: usize) -> TreeNode {
        if depth >= self.max_depth || y.len() < MIN_SPLIT_SAMPLES {
            return TreeNode::Leaf { value: mean(y) };
        }

        let mut best: Option<(usize, f64)> = None;
        for i in 1..y.len() - 1 {
            let sse = sum_squared_error(&y[..i]) + sum_squared_error(&y[i..]);
            if best.map_or(true, |(_, best_sse)| sse < best_sse) {
                best = Some((i, sse));
            }
        }

        match best {
            Some((i, _)) => TreeNode::Internal {
                threshold: x[i],
                left: Box::new(self.build(&x[..i], &y[..i], depth + 1)),
                right: Box::new(self.build(&x[i..], &y[i..], depth + 1)),
            },
            None => TreeNode::Leaf { value: mean(y) },
        }
    }

    /// Walk from the root: left when `value < threshold`, otherwise right.
    /// An unfitted tree predicts 0.
    pub fn predict(&self, value: f64) -> f64 {
        let mut node = match &self.root {
            Some(root) => root,
            None => return 0.0,
        };
        loop {
            match node {
                TreeNode::Leaf { value: leaf } => return *leaf,
                TreeNode::Internal {
                    threshold,
                    left,
                    right,
                } => {
                    node = if value < *threshold { left } else { right };
                }
            }
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sum_squared_error(values: &[f64]) -> f64 {
    let m = mean(values);
    values.iter().map(|v| (v - m).powi(2)).sum()
}
