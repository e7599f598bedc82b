//! End-to-end planning scenarios.
//!
//! ```bash
//! cargo test --test reservoir_scenarios
//! ```

use chrono::Month;
use rstest::{fixture, rstest};

use reservoir_planner::config::{Config, EngineConfig};
use reservoir_planner::domain::{
    CapacitySource, ConstraintFlag, Geometry, HydrologicalSeries, Regime, StaticLevels,
};
use reservoir_planner::hydraulics::{Formulas, InterpolationKind};
use reservoir_planner::optimizer::StrategyKind;
use reservoir_planner::planner::ReservoirPlanner;
use reservoir_planner::simulation::{
    MonthSelector, OperatingYear, ReservoirSimulator, ScheduledReleasePolicy, SimulationConfig,
};
use reservoir_planner::PlanningError;

const SCENARIO_INFLOWS: [f64; 12] = [
    10.0, 10.0, 10.0, 10.0, 50.0, 80.0, 100.0, 80.0, 50.0, 20.0, 10.0, 10.0,
];

#[fixture]
fn geometry() -> Geometry {
    Geometry::new(vec![0.0, 1000.0], vec![100.0, 120.0]).unwrap()
}

#[fixture]
fn levels() -> StaticLevels {
    StaticLevels::new(118.0, 102.0, 50.0).unwrap()
}

fn planner(inflows: &[f64], config: EngineConfig) -> ReservoirPlanner {
    ReservoirPlanner::new(
        geometry(),
        levels(),
        HydrologicalSeries::from_calendar(inflows).unwrap(),
        config,
    )
}

#[rstest]
#[case(InterpolationKind::Linear)]
#[case(InterpolationKind::MonotoneCubic)]
fn test_fixed_release_from_full_reservoir(
    geometry: Geometry,
    levels: StaticLevels,
    #[case] interpolation: InterpolationKind,
) {
    let config = SimulationConfig {
        starting_storage: Some(900.0),
        min_release: 50.0,
        ..Default::default()
    };
    let series = HydrologicalSeries::from_calendar(&[0.0; 12])
        .unwrap()
        .rotated_to(Month::April);
    let year = OperatingYear::new(series, vec![Regime::Normal; 12]).unwrap();
    let simulator = ReservoirSimulator::new(
        &geometry,
        &levels,
        interpolation.interpolator(),
        Formulas::default(),
        &config,
    )
    .unwrap();
    let state = simulator
        .run(&year, &ScheduledReleasePolicy::new(vec![50.0; 12]))
        .unwrap();

    let april = &state.records()[0];
    let hours = 30.0 * 24.0;
    let discharge = 50.0 * 1e6 / (hours * 3600.0);
    let power = 8.5 * discharge * 117.0 / 1000.0;

    assert!((april.storage_end - 850.0).abs() < 1e-6);
    assert!((april.elevation - 117.0).abs() < 1e-6);
    assert!((april.head - 117.0).abs() < 1e-6);
    assert!((april.power_mw - power).abs() < 1e-6);
    assert!((april.energy_mwh - power * hours).abs() < 1e-6);

    // Twelve months of 50 from 900 with no inflow ends at 300, above the floor.
    assert!((state.final_storage() - 300.0).abs() < 1e-6);
    assert_eq!(state.flagged_months(), 0);
}

#[test]
fn test_invalid_levels_fail_before_simulation() {
    let err = StaticLevels::new(100.0, 102.0, 50.0).unwrap_err();
    assert!(matches!(err, PlanningError::InvalidLevels(_)));

    let err = StaticLevels::new(118.0, 102.0, 0.0).unwrap_err();
    assert!(matches!(err, PlanningError::InvalidLevels(_)));

    let g = geometry();
    let outside = StaticLevels::new(125.0, 102.0, 50.0).unwrap();
    let config = SimulationConfig::default();
    let result = ReservoirSimulator::new(
        &g,
        &outside,
        InterpolationKind::Linear.interpolator(),
        Formulas::default(),
        &config,
    );
    assert!(matches!(result, Err(PlanningError::InvalidLevels(_))));
}

#[test]
fn test_scenario_year_selection() {
    let year = MonthSelector::default().select(&HydrologicalSeries::from_calendar(&SCENARIO_INFLOWS).unwrap());
    assert_eq!(year.start_month(), Month::February);
    let flood = year.months_in(Regime::Flood);
    for month in [Month::June, Month::July, Month::August] {
        assert!(flood.contains(&month));
    }
}

#[rstest]
#[case(StrategyKind::Greedy, 1.0, 0.0)]
#[case(StrategyKind::Greedy, 3.0, 5.0)]
#[case(StrategyKind::Greedy, 0.2, 20.0)]
#[case(StrategyKind::Dynamic, 1.0, 0.0)]
#[case(StrategyKind::Dynamic, 3.0, 5.0)]
#[case(StrategyKind::Dynamic, 0.2, 20.0)]
#[case(StrategyKind::GreyWolf, 1.0, 0.0)]
#[case(StrategyKind::GreyWolf, 0.2, 20.0)]
fn test_trajectory_respects_plant_limits(
    #[case] kind: StrategyKind,
    #[case] inflow_scale: f64,
    #[case] min_release: f64,
) {
    let inflows: Vec<f64> = SCENARIO_INFLOWS.iter().map(|q| q * inflow_scale).collect();
    let mut config = EngineConfig::default();
    config.simulation.min_release = min_release;
    let p = planner(&inflows, config);
    let report = p.plan_with(kind).unwrap();

    let floor = 100.0;
    for record in report.state.records() {
        assert!(record.power_mw <= 50.0 + 1e-9);
        assert!(record.storage_end <= 900.0 + 1e-6);
        assert!(record.storage_end >= floor - 1e-6 || record.has_flag(ConstraintFlag::UnmetRelease));
        assert!((record.turbine_release + record.spill - record.release).abs() < 1e-9);
        assert!(
            (record.storage_start + record.inflow - record.release - record.storage_end).abs() < 1e-6
        );
    }
    assert_eq!(report.state.records().len(), 12);
}

#[test]
fn test_guaranteed_capacity_is_dry_minimum() {
    let report = planner(&SCENARIO_INFLOWS, EngineConfig::default()).plan().unwrap();
    let capacity = report.summary.guaranteed_capacity.unwrap();
    assert_eq!(capacity.source, CapacitySource::DryMonths);

    let expected = report
        .state
        .records()
        .iter()
        .filter(|r| r.regime == Regime::Dry)
        .map(|r| r.power_mw)
        .fold(f64::INFINITY, f64::min);
    assert_eq!(capacity.value_mw, expected);
}

#[test]
fn test_guaranteed_capacity_without_dry_months() {
    // Uniform inflow: every month is normal.
    let report = planner(&[30.0; 12], EngineConfig::default()).plan().unwrap();
    let capacity = report.summary.guaranteed_capacity.unwrap();
    assert_eq!(capacity.source, CapacitySource::NormalMonths);
}

#[rstest]
#[case(StrategyKind::Greedy)]
#[case(StrategyKind::Dynamic)]
fn test_firm_target_holds_while_storage_above_floor(#[case] kind: StrategyKind) {
    let mut config = EngineConfig::default();
    config.simulation.guaranteed_power_mw = Some(8.0);
    let report = planner(&SCENARIO_INFLOWS, config).plan_with(kind).unwrap();

    let dry = report.state.records().iter().filter(|r| r.regime == Regime::Dry).count();
    assert!(dry > 0);
    for record in report.state.records() {
        if record.storage_end > 100.0 + 1e-6 {
            assert!(
                record.power_mw >= 8.0 - 1e-6,
                "{} fell to {} MW",
                record.month.name(),
                record.power_mw
            );
        }
    }
    assert_eq!(report.state.months_with(ConstraintFlag::PowerShortfall), 0);
}

#[test]
fn test_greedy_dry_months_reach_target_at_end_of_month_head() {
    let mut config = EngineConfig::default();
    config.simulation.guaranteed_power_mw = Some(20.0);
    let report = planner(&SCENARIO_INFLOWS, config).plan().unwrap();

    for record in report.state.records().iter().filter(|r| r.regime == Regime::Dry) {
        if record.storage_end > 100.0 + 1e-6 {
            assert!(record.power_mw >= 20.0 - 1e-6);
            assert!(!record.has_flag(ConstraintFlag::PowerShortfall));
        } else {
            assert!(record.power_mw >= 20.0 - 1e-6 || record.has_flag(ConstraintFlag::PowerShortfall));
        }
    }
}

#[test]
fn test_scenario_power_targets_reach_simulation() {
    let cfg = Config::load_from("config/default.toml").unwrap();
    let mut scenario = cfg.scenario.clone();
    let mut targets = vec![50.0; 12];
    targets[0] = 75.0;
    scenario.guaranteed_power_mw = Some(targets);

    let report = ReservoirPlanner::from_scenario(scenario.into_inputs().unwrap(), cfg.engine.clone())
        .plan()
        .unwrap();
    for record in report.state.records() {
        let expected = if record.month == Month::January { 75.0 } else { 50.0 };
        assert_eq!(record.power_target_mw, Some(expected));
    }
}

#[test]
fn test_concurrent_plans_match_sequential() {
    let p = planner(&SCENARIO_INFLOWS, EngineConfig::default());
    let sequential: Vec<_> = [StrategyKind::Greedy, StrategyKind::Dynamic, StrategyKind::GreyWolf]
        .into_iter()
        .map(|k| p.plan_with(k).unwrap())
        .collect();

    let concurrent: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = [StrategyKind::Greedy, StrategyKind::Dynamic, StrategyKind::GreyWolf]
            .into_iter()
            .map(|k| {
                let p = &p;
                scope.spawn(move || p.plan_with(k).unwrap())
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(sequential, concurrent);
}

#[test]
fn test_dynamic_programming_closes_cycle() {
    let mut config = EngineConfig::default();
    config.strategy = StrategyKind::Dynamic;
    let step = 800.0 / config.dynamic.storage_steps as f64;
    let report = planner(&SCENARIO_INFLOWS, config).plan().unwrap();

    assert_eq!(report.state.strategy(), "dynamic");
    assert!((report.state.final_storage() - report.state.initial_storage()).abs() <= step + 1e-6);
}

#[test]
fn test_default_configuration_plans() {
    let cfg = Config::load_from("config/default.toml").unwrap();
    let inputs = cfg.scenario.into_inputs().unwrap();
    assert!(inputs.geometry.has_tailwater_curve());

    let report = ReservoirPlanner::from_scenario(inputs, cfg.engine.clone())
        .plan()
        .unwrap();
    assert_eq!(report.state.records().len(), 12);
    assert!(report.summary.annual_energy_mwh > 0.0);
    for record in report.state.records() {
        assert!(record.power_mw <= 500.0 + 1e-9);
        assert!(record.head > 0.0);
    }

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["state"]["records"].as_array().map(Vec::len), Some(12));
}
