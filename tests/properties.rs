//! Property tests for curve interpolation, year rotation and the
//! simulator's physical limits.

use std::collections::HashSet;

use proptest::prelude::*;

use reservoir_planner::domain::{ConstraintFlag, Geometry, HydrologicalSeries, StaticLevels};
use reservoir_planner::hydraulics::{CurveTable, Formulas, InterpolationKind};
use reservoir_planner::optimizer::{GreedyHeuristic, OperatingStrategy, PlanInputs};
use reservoir_planner::simulation::{MonthSelector, SimulationConfig};

fn curve() -> impl Strategy<Value = CurveTable> {
    prop::collection::vec((0.1f64..50.0, -100.0f64..100.0), 2..10).prop_map(|pairs| {
        let mut x = 0.0;
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs
            .into_iter()
            .map(|(dx, y)| {
                x += dx;
                (x, y)
            })
            .unzip();
        CurveTable::new(xs, ys).unwrap()
    })
}

fn kind() -> impl Strategy<Value = InterpolationKind> {
    prop_oneof![Just(InterpolationKind::Linear), Just(InterpolationKind::MonotoneCubic)]
}

fn inflows() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..200.0, 12)
}

proptest! {
    #[test]
    fn prop_interpolation_hits_samples(table in curve(), kind in kind()) {
        let interp = kind.interpolator();
        for (&x, &y) in table.xs().iter().zip(table.ys()) {
            prop_assert!((interp.evaluate(&table, x) - y).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_interpolation_clamps_outside_range(table in curve(), kind in kind(), offset in 0.0f64..1e4) {
        let interp = kind.interpolator();
        let (lo, hi) = table.x_range();
        let first = table.ys()[0];
        let last = table.ys()[table.len() - 1];
        prop_assert_eq!(interp.evaluate(&table, lo - offset), first);
        prop_assert_eq!(interp.evaluate(&table, hi + offset), last);
    }

    #[test]
    fn prop_rotation_is_idempotent_bijection(inflows in inflows()) {
        let series = HydrologicalSeries::from_calendar(&inflows).unwrap();
        let selector = MonthSelector::default();
        let once = selector.rotate(&series);
        let twice = selector.rotate(&once);
        prop_assert_eq!(&once, &twice);

        let months: HashSet<_> = once.months().into_iter().collect();
        prop_assert_eq!(months.len(), 12);
        for entry in series.iter() {
            prop_assert_eq!(once.inflow(entry.month), entry.inflow);
        }
    }

    #[test]
    fn prop_greedy_respects_limits(inflows in inflows(), min_release in 0.0f64..60.0) {
        let geometry = Geometry::new(vec![0.0, 1000.0], vec![100.0, 120.0]).unwrap();
        let levels = StaticLevels::new(118.0, 102.0, 50.0).unwrap();
        let year = MonthSelector::default().select(&HydrologicalSeries::from_calendar(&inflows).unwrap());
        let simulation = SimulationConfig { min_release, ..Default::default() };
        let inputs = PlanInputs {
            geometry: &geometry,
            levels: &levels,
            year: &year,
            interpolator: InterpolationKind::Linear.interpolator(),
            formulas: Formulas::default(),
            simulation: &simulation,
        };
        let floor = inputs.simulator().unwrap().min_volume();

        let state = GreedyHeuristic.plan(&inputs).unwrap();
        for record in state.records() {
            prop_assert!(record.power_mw <= levels.installed_capacity_mw() + 1e-9);
            prop_assert!(
                record.storage_end >= floor - 1e-9 || record.has_flag(ConstraintFlag::UnmetRelease)
            );
        }
    }
}
