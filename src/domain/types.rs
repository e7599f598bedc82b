use chrono::Month;
use serde::{Deserialize, Serialize};

// ============================================================================
// Regimes & Flags
// ============================================================================

/// Operating regime of a month, derived from its relative inflow.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Regime {
    /// High-inflow months: fill towards NRL, pass the surplus downstream
    Flood,
    /// Months between the extremes: follow a smooth drawdown/fill line
    Normal,
    /// Low-inflow months: draw storage down to support firm output
    Dry,
}

/// Constraint violation recorded on a month instead of aborting the run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintFlag {
    /// Release exceeded the discharge the units can pass at installed capacity
    Spilled,
    /// The required release could not be delivered without breaching the floor
    UnmetRelease,
    /// Storage ended the month below the minimum-level volume
    StorageFloorBreach,
    /// Output fell short of the month's firm power target
    PowerShortfall,
}

// ============================================================================
// Trajectory Records
// ============================================================================

/// One row of the simulated trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthRecord {
    pub month: Month,
    pub regime: Regime,
    /// Inflow volume over the month (storage units)
    pub inflow: f64,
    /// Total release volume, turbine plus spill (storage units)
    pub release: f64,
    pub turbine_release: f64,
    pub spill: f64,
    /// Required release that could not be delivered (storage units)
    pub unmet_release: f64,
    pub storage_start: f64,
    pub storage_end: f64,
    /// Forebay elevation at end of month (m)
    pub elevation: f64,
    /// Surface area at end of month, when the geometry carries an area curve
    pub surface_area: Option<f64>,
    pub tailwater_elevation: f64,
    /// Head at end-of-month storage (m)
    pub head: f64,
    /// Mean total discharge (m³/s)
    pub discharge: f64,
    /// Mean turbine discharge (m³/s)
    pub turbine_discharge: f64,
    pub power_mw: f64,
    /// Firm output the month was asked to deliver, when one is configured
    pub power_target_mw: Option<f64>,
    pub hours: f64,
    pub energy_mwh: f64,
    pub flags: Vec<ConstraintFlag>,
}

impl MonthRecord {
    pub fn has_flag(&self, flag: ConstraintFlag) -> bool {
        self.flags.contains(&flag)
    }

    pub fn is_feasible(&self) -> bool {
        self.flags.is_empty()
    }
}

// ============================================================================
// Guaranteed Capacity
// ============================================================================

/// Which months the guaranteed capacity was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CapacitySource {
    DryMonths,
    /// No dry month in the year; minimum over normal months
    NormalMonths,
    /// Every month is a flood month; power of the lowest-inflow month
    LowestInflowMonth,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GuaranteedCapacity {
    pub value_mw: f64,
    pub source: CapacitySource,
}
