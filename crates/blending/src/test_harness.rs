//! # TestPlant: headless harness for plugin-level tests and benches
//!
//! Wraps a `bevy::app::App` with `MinimalPlugins` and `BlendingPlugin`.
//! The clock advances by one step interval per `app.update()`, so each tick
//! runs `FixedUpdate` exactly once without depending on wall-clock time.

use bevy::app::App;
use bevy::prelude::*;

use crate::predictor::{PredictionReport, PredictorConfig, WaterPredictor};
use crate::simulation::{SimulationConfig, SimulationState};
use crate::systems::{LatestReport, PlantCommand};
use crate::tank::TankType;
use crate::{use_manual_step_clock, BlendingPlugin};

pub struct TestPlant {
    app: App,
}

impl Default for TestPlant {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPlant {
    /// Plant with the default seed and configuration.
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default(), PredictorConfig::default())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(
            SimulationConfig {
                seed,
                ..Default::default()
            },
            PredictorConfig::default(),
        )
    }

    pub fn with_config(simulation: SimulationConfig, predictor: PredictorConfig) -> Self {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins);
        use_manual_step_clock(&mut app);
        // Configs go in before the plugin so it builds from them.
        app.insert_resource(simulation);
        app.insert_resource(predictor);
        app.add_plugins(BlendingPlugin);
        app.update();
        Self { app }
    }

    // -----------------------------------------------------------------------
    // Driving
    // -----------------------------------------------------------------------

    /// Run `n` fixed ticks; each applies queued commands, steps once and
    /// refreshes the prediction.
    pub fn tick(&mut self, n: u32) {
        for _ in 0..n {
            self.app.update();
        }
    }

    /// Queue a command for the next tick.
    pub fn send(&mut self, command: PlantCommand) -> &mut Self {
        self.app.world_mut().send_event(command);
        self
    }

    pub fn set_blend_ratio(&mut self, ro: f64, rain: f64) -> &mut Self {
        self.send(PlantCommand::SetBlendRatio { ro, rain })
    }

    pub fn fill_tank(&mut self, tank: TankType, level: f64) -> &mut Self {
        self.send(PlantCommand::FillTank { tank, level })
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &SimulationState {
        self.app.world().resource::<SimulationState>()
    }

    pub fn predictor(&self) -> &WaterPredictor {
        self.app.world().resource::<WaterPredictor>()
    }

    pub fn latest_report(&self) -> Option<&PredictionReport> {
        self.app.world().resource::<LatestReport>().0.as_ref()
    }

    pub fn world_mut(&mut self) -> &mut World {
        self.app.world_mut()
    }
}
