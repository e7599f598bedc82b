use serde::{Deserialize, Serialize};

use super::{
    DynamicProgrammingConfig, DynamicProgrammingOptimizer, GreedyHeuristic, GreyWolfConfig, GreyWolfOptimizer,
};
use crate::domain::{Geometry, StaticLevels};
use crate::error::Result;
use crate::hydraulics::{Formulas, Interpolator};
use crate::simulation::{OperatingYear, ReservoirSimulator, SimulationConfig, SimulationState};

/// Read-only inputs shared by every strategy.
#[derive(Debug, Clone, Copy)]
pub struct PlanInputs<'a> {
    pub geometry: &'a Geometry,
    pub levels: &'a StaticLevels,
    pub year: &'a OperatingYear,
    pub interpolator: &'a dyn Interpolator,
    pub formulas: Formulas,
    pub simulation: &'a SimulationConfig,
}

impl<'a> PlanInputs<'a> {
    pub fn simulator(&self) -> Result<ReservoirSimulator<'a>> {
        ReservoirSimulator::new(
            self.geometry,
            self.levels,
            self.interpolator,
            self.formulas,
            self.simulation,
        )
    }
}

/// Produces a full operating trajectory. Every strategy returns the same
/// [`SimulationState`] shape, so consumers never special-case one.
pub trait OperatingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn plan(&self, inputs: &PlanInputs<'_>) -> Result<SimulationState>;
}

pub struct ReservoirOptimizer {
    pub strategy: Box<dyn OperatingStrategy>,
}

impl ReservoirOptimizer {
    pub fn new(strategy: Box<dyn OperatingStrategy>) -> Self {
        Self { strategy }
    }

    pub fn name(&self) -> &'static str {
        self.strategy.name()
    }

    pub fn plan(&self, inputs: &PlanInputs<'_>) -> Result<SimulationState> {
        self.strategy.plan(inputs)
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    #[default]
    Greedy,
    Dynamic,
    GreyWolf,
}

impl StrategyKind {
    pub fn build(self, dynamic: &DynamicProgrammingConfig, grey_wolf: &GreyWolfConfig) -> Box<dyn OperatingStrategy> {
        match self {
            StrategyKind::Greedy => Box::new(GreedyHeuristic),
            StrategyKind::Dynamic => Box::new(DynamicProgrammingOptimizer::new(dynamic.clone())),
            StrategyKind::GreyWolf => Box::new(GreyWolfOptimizer::new(grey_wolf.clone())),
        }
    }
}
