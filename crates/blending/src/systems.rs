//! ECS wiring: commands in, one simulation step and one prediction per
//! fixed tick, events out.

use bevy::prelude::*;

use crate::predictor::{PredictionReport, WaterPredictor};
use crate::simulation::{SimulationReading, SimulationState};
use crate::tank::TankType;

// =============================================================================
// Events
// =============================================================================

/// Boundary mutation requested by an operator or agent. Applied at the start
/// of the next fixed tick, before stepping.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum PlantCommand {
    SetBlendRatio { ro: f64, rain: f64 },
    FillTank { tank: TankType, level: f64 },
    Reset { seed: u64 },
}

/// Fired after every simulation step.
#[derive(Event, Debug, Clone)]
pub struct SimulationStepped(pub SimulationReading);

/// Fired after every prediction report.
#[derive(Event, Debug, Clone)]
pub struct PredictionReady(pub PredictionReport);

// =============================================================================
// Resources
// =============================================================================

/// Most recent report, for pull-style consumers.
#[derive(Resource, Debug, Clone, Default)]
pub struct LatestReport(pub Option<PredictionReport>);

// =============================================================================
// Systems
// =============================================================================

pub fn apply_plant_commands(
    mut commands: EventReader<PlantCommand>,
    mut state: ResMut<SimulationState>,
    mut predictor: ResMut<WaterPredictor>,
    mut latest: ResMut<LatestReport>,
) {
    for command in commands.read() {
        match *command {
            PlantCommand::SetBlendRatio { ro, rain } => match state.set_blend_ratio(ro, rain) {
                Ok(ratio) => info!("Blend ratio set to ro={:.3} rain={:.3}", ratio.ro, ratio.rain),
                Err(e) => warn!("Rejected blend ratio: {e}"),
            },
            PlantCommand::FillTank { tank, level } => match state.fill_tank(tank, level) {
                Ok(applied) => info!("{} filled to {:.1}%", tank.name(), applied),
                Err(e) => warn!("Rejected fill for {}: {e}", tank.name()),
            },
            PlantCommand::Reset { seed } => {
                state.reset(seed);
                predictor.reset();
                latest.0 = None;
            }
        }
    }
}

pub fn step_simulation(
    mut state: ResMut<SimulationState>,
    mut stepped: EventWriter<SimulationStepped>,
) {
    let reading = state.step();
    debug!(
        "Step {}: blended tds={} level={}",
        reading.timestep, reading.tanks.blended.tds, reading.tanks.blended.level
    );
    stepped.send(SimulationStepped(reading));
}

pub fn update_prediction(
    mut stepped: EventReader<SimulationStepped>,
    mut predictor: ResMut<WaterPredictor>,
    mut latest: ResMut<LatestReport>,
    mut ready: EventWriter<PredictionReady>,
) {
    for SimulationStepped(reading) in stepped.read() {
        let report = predictor.get_prediction_report(&reading.tanks, reading.blend_ratio);
        latest.0 = Some(report.clone());
        ready.send(PredictionReady(report));
    }
}
