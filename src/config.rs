use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

use crate::domain::{Geometry, HydrologicalSeries, StaticLevels, MONTHS_PER_YEAR};
use crate::error::PlanningError;
use crate::hydraulics::{FormulaConfig, InterpolationKind};
use crate::optimizer::{DynamicProgrammingConfig, GreyWolfConfig, StrategyKind};
use crate::simulation::{RegimeThresholds, SimulationConfig};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "RESERVOIR__";

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Config {
    #[serde(default)]
    #[validate(nested)]
    pub engine: EngineConfig,
    #[validate(nested)]
    pub scenario: ScenarioConfig,
}

/// Everything that tunes how a plan is computed, independent of the plant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    pub interpolation: InterpolationKind,
    pub strategy: StrategyKind,
    #[validate(nested)]
    pub formulas: FormulaConfig,
    #[validate(nested)]
    pub regimes: RegimeThresholds,
    #[validate(nested)]
    pub simulation: SimulationConfig,
    #[validate(nested)]
    pub dynamic: DynamicProgrammingConfig,
    #[validate(nested)]
    pub grey_wolf: GreyWolfConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TailwaterConfig {
    pub discharges: Vec<f64>,
    pub elevations: Vec<f64>,
}

/// One plant and its water year, as written in the configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, Validate)]
pub struct ScenarioConfig {
    #[serde(default = "default_scenario_name")]
    pub name: String,
    #[validate(length(min = 2))]
    pub volumes: Vec<f64>,
    #[validate(length(min = 2))]
    pub elevations: Vec<f64>,
    #[serde(default)]
    pub areas: Option<Vec<f64>>,
    #[serde(default)]
    pub tailwater: Option<TailwaterConfig>,
    pub nrl: f64,
    pub min_level: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub installed_capacity_mw: f64,
    /// Calendar month (1-12) of the first inflow value
    #[serde(default = "default_first_month")]
    #[validate(range(min = 1, max = 12))]
    pub first_month: u32,
    pub inflows: Vec<f64>,
    /// Firm output per month (MW), in the same order as `inflows`
    #[serde(default)]
    pub guaranteed_power_mw: Option<Vec<f64>>,
}

fn default_scenario_name() -> String {
    "reservoir".to_string()
}

fn default_first_month() -> u32 {
    1
}

/// Validated domain inputs built from a [`ScenarioConfig`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioInputs {
    pub geometry: Geometry,
    pub levels: StaticLevels,
    pub series: HydrologicalSeries,
    /// Per-month firm output, January first
    pub power_targets: Option<Vec<f64>>,
}

impl ScenarioConfig {
    pub fn into_inputs(&self) -> Result<ScenarioInputs, PlanningError> {
        if !(1..=12).contains(&self.first_month) {
            return Err(PlanningError::InvalidSeries(format!(
                "first month must be 1-12, got {}",
                self.first_month
            )));
        }
        let mut geometry = Geometry::new(self.volumes.clone(), self.elevations.clone())?;
        if let Some(areas) = &self.areas {
            geometry = geometry.with_areas(areas.clone())?;
        }
        if let Some(tw) = &self.tailwater {
            geometry = geometry.with_tailwater_curve(tw.discharges.clone(), tw.elevations.clone())?;
        }

        let levels = StaticLevels::new(self.nrl, self.min_level, self.installed_capacity_mw)?;

        let month_of = |i: usize| (self.first_month - 1 + i as u32) % MONTHS_PER_YEAR as u32 + 1;
        let entries = self
            .inflows
            .iter()
            .enumerate()
            .map(|(i, &q)| (month_of(i), q))
            .collect();
        let series = HydrologicalSeries::from_entries(entries)?;

        let power_targets = match &self.guaranteed_power_mw {
            Some(targets) if targets.len() != MONTHS_PER_YEAR => {
                return Err(PlanningError::InvalidSeries(format!(
                    "expected {} monthly power targets, got {}",
                    MONTHS_PER_YEAR,
                    targets.len()
                )));
            }
            Some(targets) => {
                let mut calendar = vec![0.0; MONTHS_PER_YEAR];
                for (i, &p) in targets.iter().enumerate() {
                    calendar[month_of(i) as usize - 1] = p;
                }
                Some(calendar)
            }
            None => None,
        };

        Ok(ScenarioInputs {
            geometry,
            levels,
            series,
            power_targets,
        })
    }
}

impl Config {
    /// `config/default.toml` overlaid with `RESERVOIR__*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment).with_context(|| format!("loading configuration from {}", path.display()))
    }

    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::extract(Figment::new().merge(Toml::string(toml)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().context("parsing configuration")?;
        config.validate().context("validating configuration")?;
        Ok(config)
    }
}
