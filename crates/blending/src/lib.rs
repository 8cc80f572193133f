use std::time::Duration;

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;

pub mod agent_protocol;
pub mod analytics;
pub mod config;
pub mod error;
pub mod predictor;
pub mod sim_rng;
pub mod simulation;
pub mod systems;
pub mod tank;

#[cfg(any(test, feature = "bench"))]
pub mod test_harness;

use config::STEP_INTERVAL_SECS;
use predictor::{PredictorConfig, WaterPredictor};
use simulation::{SimulationConfig, SimulationState};
use systems::{
    apply_plant_commands, step_simulation, update_prediction, LatestReport, PlantCommand,
    PredictionReady, SimulationStepped,
};

/// Runs the plant on the fixed-timestep schedule: one step and one
/// prediction report per tick.
///
/// Insert `SimulationConfig` / `PredictorConfig` before adding the plugin to
/// override the defaults; a pre-inserted `SimulationState` or
/// `WaterPredictor` is kept as is.
pub struct BlendingPlugin;

impl Plugin for BlendingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SimulationConfig>()
            .init_resource::<PredictorConfig>()
            .init_resource::<LatestReport>()
            .insert_resource(Time::<Fixed>::from_seconds(STEP_INTERVAL_SECS))
            .add_event::<PlantCommand>()
            .add_event::<SimulationStepped>()
            .add_event::<PredictionReady>()
            .add_systems(Startup, log_plant_start)
            .add_systems(
                FixedUpdate,
                (apply_plant_commands, step_simulation, update_prediction).chain(),
            );

        if !app.world().contains_resource::<SimulationState>() {
            let config = app.world().resource::<SimulationConfig>().clone();
            app.insert_resource(SimulationState::new(config));
        }
        if !app.world().contains_resource::<WaterPredictor>() {
            let config = app.world().resource::<PredictorConfig>().clone();
            app.insert_resource(WaterPredictor::new(config));
        }
    }
}

fn log_plant_start(state: Res<SimulationState>, predictor: Res<WaterPredictor>) {
    info!(
        "Blending plant started: seed {}, {} trees, history {}",
        state.seed(),
        predictor.config().num_trees,
        predictor.config().history_size
    );
}

/// Advance the clock by exactly one step interval per `App::update`, so a
/// headless driver gets one fixed tick per update regardless of wall-clock
/// time. Requires `TimePlugin` (part of `MinimalPlugins`).
pub fn use_manual_step_clock(app: &mut App) {
    let step = Duration::from_secs_f64(STEP_INTERVAL_SECS);
    app.insert_resource(TimeUpdateStrategy::ManualDuration(step));
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .set_max_delta(step);
}
