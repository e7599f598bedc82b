//! Facade tying the pieces together: select the operating year, build the
//! configured strategy, run it, summarise.

use chrono::Month;
use serde::Serialize;
use tracing::info;

use crate::config::{EngineConfig, ScenarioInputs};
use crate::domain::{Geometry, HydrologicalSeries, StaticLevels};
use crate::error::Result;
use crate::hydraulics::Formulas;
use crate::optimizer::{PlanInputs, ReservoirOptimizer, StrategyKind};
use crate::simulation::{MonthSelector, OperatingYear, PlanSummary, SimulationState};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanReport {
    pub strategy: StrategyKind,
    pub start_month: Month,
    pub year: OperatingYear,
    pub summary: PlanSummary,
    pub state: SimulationState,
}

/// Owns one plant and its water year. `plan_with` takes `&self`, so a
/// single planner can be shared across threads to compare strategies.
#[derive(Debug, Clone)]
pub struct ReservoirPlanner {
    geometry: Geometry,
    levels: StaticLevels,
    series: HydrologicalSeries,
    config: EngineConfig,
}

impl ReservoirPlanner {
    pub fn new(geometry: Geometry, levels: StaticLevels, series: HydrologicalSeries, config: EngineConfig) -> Self {
        Self {
            geometry,
            levels,
            series,
            config,
        }
    }

    /// Scenario power targets, when given, replace any monthly targets in
    /// `config`.
    pub fn from_scenario(inputs: ScenarioInputs, mut config: EngineConfig) -> Self {
        if inputs.power_targets.is_some() {
            config.simulation.monthly_guaranteed_power_mw = inputs.power_targets;
        }
        Self::new(inputs.geometry, inputs.levels, inputs.series, config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn operating_year(&self) -> OperatingYear {
        MonthSelector::new(self.config.regimes).select(&self.series)
    }

    /// Plan with the configured strategy.
    pub fn plan(&self) -> Result<PlanReport> {
        self.plan_with(self.config.strategy)
    }

    pub fn plan_with(&self, kind: StrategyKind) -> Result<PlanReport> {
        let year = self.operating_year();
        let optimizer = ReservoirOptimizer::new(kind.build(&self.config.dynamic, &self.config.grey_wolf));
        let inputs = PlanInputs {
            geometry: &self.geometry,
            levels: &self.levels,
            year: &year,
            interpolator: self.config.interpolation.interpolator(),
            formulas: Formulas::new(&self.config.formulas),
            simulation: &self.config.simulation,
        };

        info!(
            strategy = optimizer.name(),
            interpolation = %self.config.interpolation,
            start_month = year.start_month().name(),
            "planning operational year"
        );
        let state = optimizer.plan(&inputs)?;

        Ok(PlanReport {
            strategy: kind,
            start_month: year.start_month(),
            summary: state.summary(),
            state,
            year,
        })
    }
}
