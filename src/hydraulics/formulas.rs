//! Hydraulic and energy formulas.
//!
//! All functions are pure. The only tunable is the plant efficiency
//! coefficient, carried in [`FormulaConfig`] so concurrent runs with
//! different plants never share mutable state.

use chrono::{Month, NaiveDate};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::Interpolator;
use crate::domain::Geometry;
use crate::error::{PlanningError, Result};

/// Empirical coefficient of `N = k * Q * H / 1000`: water density, gravity
/// and average turbine-generator efficiency lumped together.
pub const DEFAULT_EFFICIENCY_COEFFICIENT: f64 = 8.5;

pub const SECONDS_PER_HOUR: f64 = 3600.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FormulaConfig {
    #[validate(range(min = 0.1, max = 9.81))]
    pub efficiency_coefficient: f64,
}

impl Default for FormulaConfig {
    fn default() -> Self {
        Self {
            efficiency_coefficient: DEFAULT_EFFICIENCY_COEFFICIENT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formulas {
    efficiency_coefficient: f64,
}

impl Default for Formulas {
    fn default() -> Self {
        Self::new(&FormulaConfig::default())
    }
}

impl Formulas {
    pub fn new(config: &FormulaConfig) -> Self {
        Self {
            efficiency_coefficient: config.efficiency_coefficient,
        }
    }

    pub fn efficiency_coefficient(&self) -> f64 {
        self.efficiency_coefficient
    }

    /// Forebay elevation at `storage` minus the tailwater elevation.
    pub fn head(
        &self,
        geometry: &Geometry,
        interpolator: &dyn Interpolator,
        storage: f64,
        tailwater_elevation: f64,
    ) -> Result<f64> {
        let head = geometry.elevation_at(interpolator, storage) - tailwater_elevation;
        if head.is_nan() || head <= 0.0 {
            return Err(PlanningError::NegativeHead { storage, head });
        }
        Ok(head)
    }

    /// Plant power in MW for a discharge in m³/s and a head in m.
    pub fn power(&self, discharge: f64, head: f64) -> f64 {
        self.efficiency_coefficient * discharge * head / 1000.0
    }

    /// Discharge (m³/s) that yields `power_mw` at `head`.
    pub fn discharge_for_power(&self, power_mw: f64, head: f64) -> f64 {
        if head <= 0.0 {
            return 0.0;
        }
        power_mw * 1000.0 / (self.efficiency_coefficient * head)
    }

    /// Energy in MWh for a constant power held over `hours`.
    pub fn energy(power_mw: f64, hours: f64) -> f64 {
        power_mw * hours
    }
}

/// Length of a calendar month in hours.
pub fn hours_in_month(year: i32, month: Month) -> f64 {
    let m = month.number_from_month();
    let first = NaiveDate::from_ymd_opt(year, m, 1);
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, m + 1, 1)
    };
    let days = match (first, next) {
        (Some(a), Some(b)) => (b - a).num_days(),
        // Out-of-range years; fall back to the proleptic rule.
        _ => days_fallback(year, month),
    };
    days as f64 * 24.0
}

fn days_fallback(year: i32, month: Month) -> i64 {
    match month {
        Month::February => {
            let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
            if leap {
                29
            } else {
                28
            }
        }
        Month::April | Month::June | Month::September | Month::November => 30,
        _ => 31,
    }
}

/// Mean discharge (m³/s) that moves `volume` storage units in `hours`.
pub fn volume_to_discharge(volume: f64, volume_unit_m3: f64, hours: f64) -> f64 {
    volume * volume_unit_m3 / (hours * SECONDS_PER_HOUR)
}

pub fn discharge_to_volume(discharge: f64, volume_unit_m3: f64, hours: f64) -> f64 {
    discharge * hours * SECONDS_PER_HOUR / volume_unit_m3
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydraulics::LinearInterpolator;
    use rstest::rstest;

    fn geometry() -> Geometry {
        Geometry::new(vec![0.0, 1000.0], vec![100.0, 120.0]).unwrap()
    }

    #[test]
    fn test_power_formula() {
        let f = Formulas::default();
        assert!((f.power(100.0, 50.0) - 42.5).abs() < 1e-12);
    }

    #[test]
    fn test_custom_coefficient() {
        let f = Formulas::new(&FormulaConfig {
            efficiency_coefficient: 9.0,
        });
        assert!((f.power(100.0, 50.0) - 45.0).abs() < 1e-12);
    }

    #[test]
    fn test_discharge_for_power_inverts_power() {
        let f = Formulas::default();
        let q = f.discharge_for_power(42.5, 50.0);
        assert!((q - 100.0).abs() < 1e-9);
        assert_eq!(f.discharge_for_power(10.0, 0.0), 0.0);
    }

    #[test]
    fn test_head_from_storage() {
        let f = Formulas::default();
        let h = f.head(&geometry(), &LinearInterpolator, 850.0, 0.0).unwrap();
        assert!((h - 117.0).abs() < 1e-9);
        let h = f.head(&geometry(), &LinearInterpolator, 500.0, 10.0).unwrap();
        assert!((h - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_head_rejects_tailwater_above_forebay() {
        let f = Formulas::default();
        let err = f.head(&geometry(), &LinearInterpolator, 0.0, 100.0).unwrap_err();
        assert!(matches!(err, PlanningError::NegativeHead { .. }));
    }

    #[rstest]
    #[case(2023, Month::January, 744.0)]
    #[case(2023, Month::February, 672.0)]
    #[case(2024, Month::February, 696.0)]
    #[case(2023, Month::April, 720.0)]
    #[case(2023, Month::December, 744.0)]
    fn test_hours_in_month(#[case] year: i32, #[case] month: Month, #[case] hours: f64) {
        assert_eq!(hours_in_month(year, month), hours);
    }

    #[test]
    fn test_volume_discharge_conversion() {
        let q = volume_to_discharge(50.0, 1e6, 720.0);
        assert!((q - 50e6 / (720.0 * 3600.0)).abs() < 1e-12);
        assert!((discharge_to_volume(q, 1e6, 720.0) - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_energy_is_power_times_duration() {
        assert_eq!(Formulas::energy(10.0, 720.0), 7200.0);
    }
}
