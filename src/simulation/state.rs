use serde::Serialize;

use crate::domain::{CapacitySource, ConstraintFlag, GuaranteedCapacity, MonthRecord, Regime};

/// Mutable state of a single run; returned as the run's result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationState {
    strategy: String,
    initial_storage: f64,
    storage: f64,
    elevation: f64,
    cumulative_energy_mwh: f64,
    records: Vec<MonthRecord>,
}

/// Scalar summaries of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub strategy: String,
    pub annual_energy_mwh: f64,
    pub guaranteed_capacity: Option<GuaranteedCapacity>,
    pub initial_storage: f64,
    pub final_storage: f64,
    pub flagged_months: usize,
}

impl SimulationState {
    pub fn new(strategy: impl Into<String>, initial_storage: f64, elevation: f64) -> Self {
        Self {
            strategy: strategy.into(),
            initial_storage,
            storage: initial_storage,
            elevation,
            cumulative_energy_mwh: 0.0,
            records: Vec::with_capacity(12),
        }
    }

    pub(crate) fn advance(&mut self, record: MonthRecord) {
        self.storage = record.storage_end;
        self.elevation = record.elevation;
        self.cumulative_energy_mwh += record.energy_mwh;
        self.records.push(record);
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn records(&self) -> &[MonthRecord] {
        &self.records
    }

    pub fn storage(&self) -> f64 {
        self.storage
    }

    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    pub fn initial_storage(&self) -> f64 {
        self.initial_storage
    }

    pub fn final_storage(&self) -> f64 {
        self.storage
    }

    pub fn annual_energy_mwh(&self) -> f64 {
        self.cumulative_energy_mwh
    }

    pub fn flagged_months(&self) -> usize {
        self.records.iter().filter(|r| !r.is_feasible()).count()
    }

    pub fn months_with(&self, flag: ConstraintFlag) -> usize {
        self.records.iter().filter(|r| r.has_flag(flag)).count()
    }

    /// Firm output: the lowest power over dry months.
    ///
    /// Without dry months the lowest power over normal months is used, and
    /// if the whole year is flood, the power of the lowest-inflow month.
    /// `None` only for an empty trajectory.
    pub fn guaranteed_capacity(&self) -> Option<GuaranteedCapacity> {
        let min_power = |regime: Regime| {
            self.records
                .iter()
                .filter(|r| r.regime == regime)
                .map(|r| r.power_mw)
                .reduce(f64::min)
        };

        if let Some(value_mw) = min_power(Regime::Dry) {
            return Some(GuaranteedCapacity {
                value_mw,
                source: CapacitySource::DryMonths,
            });
        }
        if let Some(value_mw) = min_power(Regime::Normal) {
            return Some(GuaranteedCapacity {
                value_mw,
                source: CapacitySource::NormalMonths,
            });
        }
        self.records
            .iter()
            .reduce(|best, r| if r.inflow < best.inflow { r } else { best })
            .map(|r| GuaranteedCapacity {
                value_mw: r.power_mw,
                source: CapacitySource::LowestInflowMonth,
            })
    }

    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            strategy: self.strategy.clone(),
            annual_energy_mwh: self.annual_energy_mwh(),
            guaranteed_capacity: self.guaranteed_capacity(),
            initial_storage: self.initial_storage,
            final_storage: self.final_storage(),
            flagged_months: self.flagged_months(),
        }
    }
}
