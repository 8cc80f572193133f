//! Predictive analytics over a time-ordered TDS series.
//!
//! Data flows one way: Storm Guard masks sensor spikes, the Random Rain
//! Forest fits the surviving points for the point forecast, and the linear
//! trend estimator labels the direction.

pub mod ema;
pub mod forest;
pub mod raindrop_tree;
pub mod storm_guard;
pub mod trend;

pub use ema::Ema;
pub use forest::{confidence_from_rmse, RandomRainForest, MIN_TRAINING_SAMPLES, UNTRAINED_RMSE};
pub use raindrop_tree::{RaindropTree, TreeNode};
pub use storm_guard::{FilteredSeries, StormGuard};
pub use trend::{LinearRegression, Trend};
