use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_RAIN_RATIO, DEFAULT_RO_RATIO, SENSOR_FLOW_RANGE, SENSOR_LEVEL_RANGE,
    SENSOR_TDS_RANGE, SENSOR_TEMP_RANGE,
};
use crate::error::BlendingError;
use crate::sim_rng::SeededRandom;

// =============================================================================
// Tank identity and configuration
// =============================================================================

/// The three tanks of the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TankType {
    RoReject,
    Rainwater,
    Blended,
}

impl TankType {
    /// All tanks, in initialization order. The order is part of the seeded
    /// trajectory and must not change.
    pub const ALL: [TankType; 3] = [TankType::RoReject, TankType::Rainwater, TankType::Blended];

    /// Stable wire key.
    pub fn key(self) -> &'static str {
        match self {
            TankType::RoReject => "ro_reject",
            TankType::Rainwater => "rainwater",
            TankType::Blended => "blended",
        }
    }

    /// Human-readable name for dashboards.
    pub fn name(self) -> &'static str {
        match self {
            TankType::RoReject => "RO Reject Tank",
            TankType::Rainwater => "Rainwater Tank",
            TankType::Blended => "Blended Tank",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        TankType::ALL.into_iter().find(|t| t.key() == key)
    }

    /// Physical configuration of this tank.
    pub fn config(self) -> TankConfig {
        match self {
            TankType::RoReject => TankConfig {
                capacity: 500.0,
                base_tds: ValueRange::new(800.0, 1500.0),
                base_temp: ValueRange::new(25.0, 35.0),
                initial_level: 75.0,
                tds_drift: 10.0,
                temp_drift: 0.3,
            },
            TankType::Rainwater => TankConfig {
                capacity: 1000.0,
                base_tds: ValueRange::new(20.0, 80.0),
                base_temp: ValueRange::new(20.0, 30.0),
                initial_level: 60.0,
                tds_drift: 3.0,
                temp_drift: 0.3,
            },
            TankType::Blended => TankConfig {
                capacity: 750.0,
                base_tds: ValueRange::new(150.0, 300.0),
                base_temp: ValueRange::new(22.0, 32.0),
                initial_level: 50.0,
                tds_drift: 0.0,
                temp_drift: 0.0,
            },
        }
    }
}

/// Closed interval `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

/// Static configuration for one tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankConfig {
    /// Volume in litres; converts flow into level change.
    pub capacity: f64,
    #[serde(rename = "baseTDS")]
    pub base_tds: ValueRange,
    pub base_temp: ValueRange,
    /// Fill level (%) after initialization or reset.
    pub initial_level: f64,
    /// Width of the per-step TDS random walk (ppm).
    pub tds_drift: f64,
    /// Width of the per-step temperature random walk (degrees C).
    pub temp_drift: f64,
}

// =============================================================================
// Per-tank container
// =============================================================================

/// One value per tank, addressed by `TankType` with exhaustive matching.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerTank<T> {
    pub ro_reject: T,
    pub rainwater: T,
    pub blended: T,
}

impl<T> PerTank<T> {
    pub fn from_fn(mut f: impl FnMut(TankType) -> T) -> Self {
        // Field order matches TankType::ALL so seeded construction is stable.
        let ro_reject = f(TankType::RoReject);
        let rainwater = f(TankType::Rainwater);
        let blended = f(TankType::Blended);
        Self {
            ro_reject,
            rainwater,
            blended,
        }
    }

    pub fn get(&self, tank: TankType) -> &T {
        match tank {
            TankType::RoReject => &self.ro_reject,
            TankType::Rainwater => &self.rainwater,
            TankType::Blended => &self.blended,
        }
    }

    pub fn get_mut(&mut self, tank: TankType) -> &mut T {
        match tank {
            TankType::RoReject => &mut self.ro_reject,
            TankType::Rainwater => &mut self.rainwater,
            TankType::Blended => &mut self.blended,
        }
    }

    pub fn map<U>(&self, mut f: impl FnMut(TankType, &T) -> U) -> PerTank<U> {
        PerTank::from_fn(|tank| f(tank, self.get(tank)))
    }
}

// =============================================================================
// Blend ratio
// =============================================================================

/// Share of the outflow drawn from each source tank. Always sums to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlendRatio {
    pub ro: f64,
    pub rain: f64,
}

impl BlendRatio {
    /// Normalize raw shares so they sum to 1.
    ///
    /// # Errors
    ///
    /// Returns `InvalidBlendRatio` for negative or non-finite shares, or when
    /// both are zero.
    pub fn new(ro: f64, rain: f64) -> Result<Self, BlendingError> {
        let total = ro + rain;
        if !ro.is_finite() || !rain.is_finite() || ro < 0.0 || rain < 0.0 || total <= 0.0 {
            return Err(BlendingError::InvalidBlendRatio { ro, rain });
        }
        Ok(Self {
            ro: ro / total,
            rain: rain / total,
        })
    }

    /// Build from the RO share alone, clamped to `[0, 1]`.
    pub fn from_ro(ro: f64) -> Self {
        let ro = ro.clamp(0.0, 1.0);
        Self { ro, rain: 1.0 - ro }
    }

    /// TDS (or any intensive property) of the linear mix of two sources.
    pub fn mix(&self, ro_value: f64, rain_value: f64) -> f64 {
        ro_value * self.ro + rain_value * self.rain
    }
}

impl Default for BlendRatio {
    fn default() -> Self {
        Self {
            ro: DEFAULT_RO_RATIO,
            rain: DEFAULT_RAIN_RATIO,
        }
    }
}

// =============================================================================
// Tank state and readings
// =============================================================================

/// Live physical state of one tank.
#[derive(Debug, Clone, PartialEq)]
pub struct TankState {
    pub tank_type: TankType,
    /// Fill level (%), always within `[0, 100]`.
    pub level: f64,
    /// Dissolved solids (ppm).
    pub tds: f64,
    /// Degrees C.
    pub temperature: f64,
    /// L/min, never negative.
    pub flow_rate: f64,
}

impl TankState {
    /// Fresh tank at its initial level with TDS and temperature drawn from the
    /// base ranges (TDS first, then temperature).
    pub fn initial(tank_type: TankType, rng: &mut SeededRandom) -> Self {
        let config = tank_type.config();
        let tds = rng.range(config.base_tds.min, config.base_tds.max);
        let temperature = rng.range(config.base_temp.min, config.base_temp.max);
        Self {
            tank_type,
            level: config.initial_level,
            tds,
            temperature,
            flow_rate: 0.0,
        }
    }

    /// Pull every quantity back into its physical range.
    pub fn clamp_to_base(&mut self) {
        let config = self.tank_type.config();
        self.level = self.level.clamp(0.0, 100.0);
        self.tds = config.base_tds.clamp(self.tds);
        self.temperature = config.base_temp.clamp(self.temperature);
        self.flow_rate = self.flow_rate.max(0.0);
    }

    /// Ambient TDS drift: one zero-mean random-walk step, clamped to the base range.
    pub fn apply_tds_drift(&mut self, rng: &mut SeededRandom) {
        let config = self.tank_type.config();
        self.tds = config.base_tds.clamp(self.tds + rng.drift(config.tds_drift));
    }

    /// Ambient temperature drift, clamped like `apply_tds_drift`.
    pub fn apply_temperature_drift(&mut self, rng: &mut SeededRandom) {
        let config = self.tank_type.config();
        self.temperature = config
            .base_temp
            .clamp(self.temperature + rng.drift(config.temp_drift));
    }

    /// Rounded, timestamped snapshot.
    pub fn reading(&self, timestamp_ms: u64) -> Reading {
        Reading {
            timestamp_ms,
            tds: round_to(self.tds, 1),
            temperature: round_to(self.temperature, 1),
            level: round_to(self.level, 1),
            flow_rate: round_to(self.flow_rate, 2),
        }
    }
}

/// Immutable sensor snapshot of one tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    /// Unix epoch milliseconds (simulated clock for generated readings).
    #[serde(rename = "timestamp", default)]
    pub timestamp_ms: u64,
    pub tds: f64,
    pub temperature: f64,
    pub level: f64,
    pub flow_rate: f64,
}

impl Reading {
    /// Check an externally ingested reading against sensor bounds.
    ///
    /// # Errors
    ///
    /// Returns the first field found outside its range.
    pub fn validate(&self, tank: TankType) -> Result<(), BlendingError> {
        let checks = [
            ("tds", self.tds, SENSOR_TDS_RANGE),
            ("temperature", self.temperature, SENSOR_TEMP_RANGE),
            ("level", self.level, SENSOR_LEVEL_RANGE),
            ("flowRate", self.flow_rate, SENSOR_FLOW_RANGE),
        ];
        for (field, value, (min, max)) in checks {
            // NaN fails both comparisons, so test for containment explicitly.
            if !(value >= min && value <= max) {
                return Err(BlendingError::InvalidReading {
                    tank,
                    field,
                    value,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

/// Round half up to `decimals` places, matching the dashboard's formatting.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale + 0.5).floor() / scale
}
