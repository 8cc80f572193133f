use std::collections::VecDeque;

use bevy::log::{info, warn};
use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::config::{
    BASE_FLOW_RATE, BLENDED_LEVEL_DELTA, DEFAULT_SEED, FLOW_NOISE, MAX_BLENDED_LEVEL,
    MAX_GENERATED_STEPS, MIN_SOURCE_LEVEL, MIX_TDS_NOISE, MIX_TEMP_NOISE,
    SIMULATION_HISTORY_CAP, SOURCE_LEVEL_DELTA, STEP_INTERVAL_MS,
};
use crate::error::BlendingError;
use crate::sim_rng::SeededRandom;
use crate::tank::{BlendRatio, PerTank, Reading, TankState, TankType};

// =============================================================================
// Configuration
// =============================================================================

/// Session parameters. Insert as a resource before `BlendingPlugin` to
/// override the defaults.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub seed: u64,
    /// Timestamp of timestep 0 (Unix epoch milliseconds).
    pub epoch_ms: u64,
    /// Simulated time between steps.
    pub step_interval_ms: u64,
    /// Blend ratio restored on every reset.
    pub blend_ratio: BlendRatio,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            epoch_ms: 0,
            step_interval_ms: STEP_INTERVAL_MS,
            blend_ratio: BlendRatio::default(),
        }
    }
}

// =============================================================================
// Readings
// =============================================================================

/// Read-only snapshot produced by every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationReading {
    pub timestep: u64,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,
    pub tanks: PerTank<Reading>,
    pub blend_ratio: BlendRatio,
}

// =============================================================================
// Session state
// =============================================================================

/// One simulation session. Owns its PRNG, tanks and history exclusively;
/// concurrent sessions need separate instances.
#[derive(Resource, Debug, Clone)]
pub struct SimulationState {
    config: SimulationConfig,
    seed: u64,
    rng: SeededRandom,
    timestep: u64,
    blend_ratio: BlendRatio,
    tanks: PerTank<TankState>,
    history: VecDeque<SimulationReading>,
    /// Flow gate result of the previous step, for logging transitions.
    was_flowing: bool,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

impl SimulationState {
    pub fn new(config: SimulationConfig) -> Self {
        let seed = config.seed;
        let mut rng = SeededRandom::new(seed);
        let tanks = PerTank::from_fn(|tank| TankState::initial(tank, &mut rng));
        Self {
            blend_ratio: config.blend_ratio,
            config,
            seed,
            rng,
            timestep: 0,
            tanks,
            history: VecDeque::new(),
            was_flowing: true,
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::new(SimulationConfig {
            seed,
            ..Default::default()
        })
    }

    /// Re-seed and reinitialize every tank, the blend ratio and the clock.
    pub fn reset(&mut self, seed: u64) {
        self.seed = seed;
        self.rng = SeededRandom::new(seed);
        let rng = &mut self.rng;
        self.tanks = PerTank::from_fn(|tank| TankState::initial(tank, rng));
        self.blend_ratio = self.config.blend_ratio;
        self.timestep = 0;
        self.history.clear();
        self.was_flowing = true;
        info!("Simulation reset with seed {}", seed);
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn timestep(&self) -> u64 {
        self.timestep
    }

    pub fn blend_ratio(&self) -> BlendRatio {
        self.blend_ratio
    }

    pub fn tank(&self, tank: TankType) -> &TankState {
        self.tanks.get(tank)
    }

    pub fn rng_state(&self) -> u32 {
        self.rng.state()
    }

    /// Simulated wall-clock time of the current timestep.
    pub fn timestamp_ms(&self) -> u64 {
        self.config.epoch_ms + self.timestep * self.config.step_interval_ms
    }

    /// Flow gate: both sources above the dry mark and the sink below overfull.
    pub fn is_flowing(&self) -> bool {
        self.tanks.ro_reject.level > MIN_SOURCE_LEVEL
            && self.tanks.rainwater.level > MIN_SOURCE_LEVEL
            && self.tanks.blended.level < MAX_BLENDED_LEVEL
    }

    // -------------------------------------------------------------------------
    // Boundary setters
    // -------------------------------------------------------------------------

    /// Normalize and apply new blend shares.
    ///
    /// # Errors
    ///
    /// Rejects negative, non-finite or all-zero shares; the current ratio is
    /// left untouched in that case.
    pub fn set_blend_ratio(&mut self, ro: f64, rain: f64) -> Result<BlendRatio, BlendingError> {
        let ratio = BlendRatio::new(ro, rain)?;
        self.blend_ratio = ratio;
        Ok(ratio)
    }

    /// Set a tank's fill level, clamped to `[0, 100]`. Returns the applied level.
    ///
    /// # Errors
    ///
    /// Rejects NaN and infinite levels.
    pub fn fill_tank(&mut self, tank: TankType, level: f64) -> Result<f64, BlendingError> {
        if !level.is_finite() {
            return Err(BlendingError::InvalidLevel(level));
        }
        let state = self.tanks.get_mut(tank);
        state.level = level.clamp(0.0, 100.0);
        Ok(state.level)
    }

    // -------------------------------------------------------------------------
    // Stepping
    // -------------------------------------------------------------------------

    /// Advance the session by one discrete step and return its snapshot.
    pub fn step(&mut self) -> SimulationReading {
        self.timestep += 1;

        let ratio = self.blend_ratio;
        let ro_flow_out = BASE_FLOW_RATE * ratio.ro;
        let rain_flow_out = BASE_FLOW_RATE * ratio.rain;

        let flowing = self.is_flowing();
        if flowing != self.was_flowing {
            if flowing {
                info!("Blend flow resumed at timestep {}", self.timestep);
            } else {
                warn!(
                    "Blend flow stopped at timestep {}: ro={:.1}% rain={:.1}% blended={:.1}%",
                    self.timestep,
                    self.tanks.ro_reject.level,
                    self.tanks.rainwater.level,
                    self.tanks.blended.level
                );
            }
            self.was_flowing = flowing;
        }

        let rng = &mut self.rng;
        let tanks = &mut self.tanks;

        if flowing {
            let mixed_tds =
                ratio.mix(tanks.ro_reject.tds, tanks.rainwater.tds) * rng.noise(MIX_TDS_NOISE);
            let mixed_temp = ratio.mix(tanks.ro_reject.temperature, tanks.rainwater.temperature)
                * rng.noise(MIX_TEMP_NOISE);

            tanks.ro_reject.level = (tanks.ro_reject.level - SOURCE_LEVEL_DELTA * ratio.ro).max(0.0);
            tanks.rainwater.level =
                (tanks.rainwater.level - SOURCE_LEVEL_DELTA * ratio.rain).max(0.0);
            tanks.blended.level = (tanks.blended.level + BLENDED_LEVEL_DELTA).min(100.0);

            tanks.blended.tds = mixed_tds;
            tanks.blended.temperature = mixed_temp;
            tanks.blended.flow_rate = (ro_flow_out + rain_flow_out) * rng.noise(FLOW_NOISE);
            tanks.ro_reject.flow_rate = ro_flow_out * rng.noise(FLOW_NOISE);
            tanks.rainwater.flow_rate = rain_flow_out * rng.noise(FLOW_NOISE);
            tanks.blended.clamp_to_base();
        } else {
            tanks.ro_reject.flow_rate = 0.0;
            tanks.rainwater.flow_rate = 0.0;
            tanks.blended.flow_rate = 0.0;
        }

        // Ambient drift on the sources runs whether or not the valves are open.
        tanks.ro_reject.apply_tds_drift(rng);
        tanks.rainwater.apply_tds_drift(rng);
        tanks.ro_reject.apply_temperature_drift(rng);
        tanks.rainwater.apply_temperature_drift(rng);

        let reading = self.current_reading();
        if self.history.len() >= SIMULATION_HISTORY_CAP {
            self.history.pop_front();
        }
        self.history.push_back(reading.clone());
        reading
    }

    /// Snapshot of the current state without stepping.
    pub fn current_reading(&self) -> SimulationReading {
        let timestamp_ms = self.timestamp_ms();
        SimulationReading {
            timestep: self.timestep,
            timestamp_ms,
            tanks: self.tanks.map(|_, state| state.reading(timestamp_ms)),
            blend_ratio: self.blend_ratio,
        }
    }

    /// The most recent `limit` step readings, oldest first.
    pub fn history(&self, limit: usize) -> Vec<SimulationReading> {
        let skip = self.history.len().saturating_sub(limit);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Reset with the session's own seed and produce a fresh series of
    /// `duration_secs / interval_secs` readings, capped at
    /// `MAX_GENERATED_STEPS`.
    pub fn generate_time_series(
        &mut self,
        duration_secs: u64,
        interval_secs: u64,
    ) -> Vec<SimulationReading> {
        let interval = interval_secs.max(1);
        let steps = ((duration_secs / interval) as usize).min(MAX_GENERATED_STEPS);
        self.reset(self.seed);
        (0..steps).map(|_| self.step()).collect()
    }
}
