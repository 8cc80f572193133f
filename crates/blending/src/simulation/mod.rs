//! Three-tank simulation session: seeded state, the step rule, and the
//! boundary setters external callers use to steer it.

pub mod state;

mod tests_bounds;

pub use state::{SimulationConfig, SimulationReading, SimulationState};
