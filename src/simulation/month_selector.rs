//! # Month Selection
//!
//! Classifies the months of a water year into operating regimes and picks
//! the month the operational year starts on.
//!
//! ## Classification rule
//!
//! With μ the mean and σ the population standard deviation of the twelve
//! inflows:
//!
//! - **Flood** when `inflow > μ + flood_sigma·σ`
//! - **Dry** when `inflow < μ − dry_sigma·σ`
//! - **Normal** otherwise
//!
//! A lone normal month squeezed between two months of the same extreme
//! regime takes that regime (`smooth_isolated_months`). Classification is
//! keyed on calendar months only, so it does not depend on how the series
//! is rotated.
//!
//! ## Rotation
//!
//! The operational year starts on the month after the lowest inflow
//! (earliest calendar month on ties), which is the start of the filling
//! season.

use chrono::Month;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use validator::Validate;

use crate::domain::{month_from_number, HydrologicalSeries, Regime, MONTHS_PER_YEAR};
use crate::error::{PlanningError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RegimeThresholds {
    /// Standard deviations above the mean for a flood month
    #[validate(range(min = 0.0, max = 5.0))]
    pub flood_sigma: f64,
    /// Standard deviations below the mean for a dry month
    #[validate(range(min = 0.0, max = 5.0))]
    pub dry_sigma: f64,
    pub smooth_isolated_months: bool,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            flood_sigma: 0.5,
            dry_sigma: 0.5,
            smooth_isolated_months: true,
        }
    }
}

/// A rotated series together with the regime of each of its months.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatingYear {
    series: HydrologicalSeries,
    regimes: Vec<Regime>,
}

impl OperatingYear {
    pub fn new(series: HydrologicalSeries, regimes: Vec<Regime>) -> Result<Self> {
        if series.len() != regimes.len() {
            return Err(PlanningError::InvalidSeries(format!(
                "{} regimes supplied for {} months",
                regimes.len(),
                series.len()
            )));
        }
        Ok(Self { series, regimes })
    }

    pub fn series(&self) -> &HydrologicalSeries {
        &self.series
    }

    pub fn regimes(&self) -> &[Regime] {
        &self.regimes
    }

    pub fn start_month(&self) -> Month {
        self.series.first_month()
    }

    pub fn len(&self) -> usize {
        self.regimes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regimes.is_empty()
    }

    pub fn months_in(&self, regime: Regime) -> Vec<Month> {
        self.series
            .iter()
            .zip(&self.regimes)
            .filter(|(_, r)| **r == regime)
            .map(|(e, _)| e.month)
            .collect()
    }

    /// Months left in the run of equal regimes starting at `index`, itself included.
    pub fn remaining_in_run(&self, index: usize) -> usize {
        let regime = self.regimes[index];
        self.regimes[index..].iter().take_while(|r| **r == regime).count()
    }

    /// First regime after `index` (wrapping around the year) that differs from it.
    pub fn next_other_regime(&self, index: usize) -> Option<Regime> {
        let n = self.regimes.len();
        let regime = self.regimes[index];
        (1..n)
            .map(|k| self.regimes[(index + k) % n])
            .find(|r| *r != regime)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MonthSelector {
    thresholds: RegimeThresholds,
}

impl MonthSelector {
    pub fn new(thresholds: RegimeThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &RegimeThresholds {
        &self.thresholds
    }

    fn calendar_inflows(series: &HydrologicalSeries) -> [f64; MONTHS_PER_YEAR] {
        let mut cal = [0.0; MONTHS_PER_YEAR];
        for e in series.iter() {
            cal[e.month.number_from_month() as usize - 1] = e.inflow;
        }
        cal
    }

    fn calendar_regimes(&self, series: &HydrologicalSeries) -> [Regime; MONTHS_PER_YEAR] {
        let cal = Self::calendar_inflows(series);
        let mean = cal.iter().mean();
        let sigma = cal.iter().population_std_dev();
        let flood_above = mean + self.thresholds.flood_sigma * sigma;
        let dry_below = mean - self.thresholds.dry_sigma * sigma;

        let raw = cal.map(|q| {
            if q > flood_above {
                Regime::Flood
            } else if q < dry_below {
                Regime::Dry
            } else {
                Regime::Normal
            }
        });

        if !self.thresholds.smooth_isolated_months {
            return raw;
        }

        let mut smoothed = raw;
        for i in 0..MONTHS_PER_YEAR {
            let prev = raw[(i + MONTHS_PER_YEAR - 1) % MONTHS_PER_YEAR];
            let next = raw[(i + 1) % MONTHS_PER_YEAR];
            if raw[i] == Regime::Normal && prev == next && prev != Regime::Normal {
                smoothed[i] = prev;
            }
        }
        smoothed
    }

    /// Regime of every month, in the read order of `series`.
    pub fn classify(&self, series: &HydrologicalSeries) -> Vec<Regime> {
        let cal = self.calendar_regimes(series);
        series
            .iter()
            .map(|e| cal[e.month.number_from_month() as usize - 1])
            .collect()
    }

    /// Month following the minimum-inflow month.
    pub fn rotation_start(&self, series: &HydrologicalSeries) -> Month {
        let cal = Self::calendar_inflows(series);
        let driest = cal
            .iter()
            .position_min_by(|a, b| a.total_cmp(b))
            .unwrap_or(0);
        // Index is 0..12, so the month number is always valid.
        month_from_number(driest as u32 + 1)
            .map(|m| m.succ())
            .unwrap_or(Month::January)
    }

    pub fn rotate(&self, series: &HydrologicalSeries) -> HydrologicalSeries {
        series.rotated_to(self.rotation_start(series))
    }

    pub fn select(&self, series: &HydrologicalSeries) -> OperatingYear {
        let rotated = self.rotate(series);
        let regimes = self.classify(&rotated);
        tracing::debug!(
            start = rotated.first_month().name(),
            flood = regimes.iter().filter(|r| **r == Regime::Flood).count(),
            dry = regimes.iter().filter(|r| **r == Regime::Dry).count(),
            "hydrological year selected"
        );
        OperatingYear { series: rotated, regimes }
    }
}
