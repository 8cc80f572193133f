#[cfg(test)]
mod tests {
    use crate::error::BlendingError;
    use crate::simulation::state::*;
    use crate::tank::TankType;

    fn assert_in_bounds(state: &SimulationState) {
        for tank in TankType::ALL {
            let s = state.tank(tank);
            let config = tank.config();
            assert!((0.0..=100.0).contains(&s.level), "{tank:?} level {}", s.level);
            assert!(config.base_tds.contains(s.tds), "{tank:?} tds {}", s.tds);
            assert!(
                config.base_temp.contains(s.temperature),
                "{tank:?} temperature {}",
                s.temperature
            );
            assert!(s.flow_rate >= 0.0);
        }
    }

    #[test]
    fn test_bounded_over_long_run() {
        for seed in [1u64, 12345, 987_654_321] {
            let mut state = SimulationState::with_seed(seed);
            for _ in 0..3_000 {
                state.step();
                assert_in_bounds(&state);
            }
        }
    }

    #[test]
    fn test_bounded_with_extreme_ratios() {
        let mut state = SimulationState::with_seed(5);
        state.set_blend_ratio(1.0, 0.0).unwrap();
        for _ in 0..500 {
            state.step();
            assert_in_bounds(&state);
        }
        state.set_blend_ratio(0.0, 1.0).unwrap();
        for _ in 0..500 {
            state.step();
            assert_in_bounds(&state);
        }
    }

    #[test]
    fn test_flowing_moves_levels() {
        let mut state = SimulationState::default();
        let ro_before = state.tank(TankType::RoReject).level;
        let blended_before = state.tank(TankType::Blended).level;
        let reading = state.step();
        assert!(state.tank(TankType::RoReject).level < ro_before);
        assert!(state.tank(TankType::Blended).level > blended_before);
        assert!(reading.tanks.blended.flow_rate > 0.0);
        assert!(reading.tanks.ro_reject.flow_rate > 0.0);
    }

    #[test]
    fn test_dry_source_stops_flow() {
        let mut state = SimulationState::default();
        state.fill_tank(TankType::Rainwater, 5.0).unwrap();
        assert!(!state.is_flowing());
        let levels_before: Vec<f64> = TankType::ALL
            .iter()
            .map(|&t| state.tank(t).level)
            .collect();
        let reading = state.step();
        let levels_after: Vec<f64> = TankType::ALL
            .iter()
            .map(|&t| state.tank(t).level)
            .collect();
        assert_eq!(levels_before, levels_after);
        assert_eq!(reading.tanks.ro_reject.flow_rate, 0.0);
        assert_eq!(reading.tanks.rainwater.flow_rate, 0.0);
        assert_eq!(reading.tanks.blended.flow_rate, 0.0);
    }

    #[test]
    fn test_overfull_sink_stops_flow() {
        let mut state = SimulationState::default();
        state.fill_tank(TankType::Blended, 95.0).unwrap();
        assert!(!state.is_flowing());
        let blended_tds = state.tank(TankType::Blended).tds;
        state.step();
        // No mixing while the gate is closed.
        assert_eq!(state.tank(TankType::Blended).tds, blended_tds);
    }

    #[test]
    fn test_drift_runs_without_flow() {
        let mut state = SimulationState::default();
        state.fill_tank(TankType::RoReject, 0.0).unwrap();
        let tds_before = state.tank(TankType::RoReject).tds;
        for _ in 0..20 {
            state.step();
        }
        assert_ne!(state.tank(TankType::RoReject).tds, tds_before);
    }

    #[test]
    fn test_fill_tank_clamps() {
        let mut state = SimulationState::default();
        assert_eq!(state.fill_tank(TankType::RoReject, 150.0), Ok(100.0));
        assert_eq!(state.fill_tank(TankType::RoReject, -3.0), Ok(0.0));
        assert!(matches!(
            state.fill_tank(TankType::RoReject, f64::NAN),
            Err(BlendingError::InvalidLevel(_))
        ));
        assert_eq!(state.tank(TankType::RoReject).level, 0.0);
    }

    #[test]
    fn test_invalid_blend_ratio_keeps_previous() {
        let mut state = SimulationState::default();
        let before = state.blend_ratio();
        assert!(state.set_blend_ratio(-1.0, 2.0).is_err());
        assert_eq!(state.blend_ratio(), before);
        let applied = state.set_blend_ratio(1.0, 1.0).unwrap();
        assert_eq!(applied.ro, 0.5);
        assert_eq!(state.step().blend_ratio.ro, 0.5);
    }

    #[test]
    fn test_source_levels_drain_to_gate() {
        let mut state = SimulationState::default();
        state.fill_tank(TankType::RoReject, 5.2).unwrap();
        state.set_blend_ratio(1.0, 0.0).unwrap();
        for _ in 0..10 {
            state.step();
        }
        // Drains 0.1 per step until the gate closes at 5%.
        assert!(state.tank(TankType::RoReject).level <= 5.0);
        assert!(state.tank(TankType::RoReject).level > 4.8);
        assert!(!state.is_flowing());
    }
}
