//! Tank identities, configuration table, live state and sensor readings.

pub mod types;


pub use types::{
    round_to, BlendRatio, PerTank, Reading, TankConfig, TankState, TankType, ValueRange,
};
