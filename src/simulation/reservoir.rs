//! # Reservoir Simulation
//!
//! Forward, month-by-month mass balance over one operational year.
//!
//! Each month:
//! 1. `available = storage + inflow`
//! 2. when the month has a firm power target, the release meeting it at
//!    end-of-month head is solved for and handed to the policy
//! 3. the release policy proposes a release
//! 4. the release is bounded: at least the minimum release, at least what
//!    keeps storage at or below NRL, at most what keeps storage at or above
//!    the minimum-level volume (shortfall flagged as unmet release)
//! 5. head is taken at end-of-month storage, turbine discharge is limited
//!    to installed capacity (the rest is spilled), energy is integrated
//!    over the calendar length of the month
//!
//! Infeasible months are flagged and the run carries on; only structural
//! problems found in [`ReservoirSimulator::new`] are errors.

use chrono::Month;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use super::{MonthContext, OperatingYear, ReleasePolicy, SimulationState};
use crate::domain::{ConstraintFlag, Geometry, MonthRecord, StaticLevels, MONTHS_PER_YEAR};
use crate::error::{PlanningError, Result};
use crate::hydraulics::{hours_in_month, volume_to_discharge, Formulas, Interpolator};

/// Volumes below this are treated as zero when deciding flags.
const VOLUME_TOLERANCE: f64 = 1e-9;
/// Power shortfalls below this (MW) are not flagged.
const POWER_TOLERANCE: f64 = 1e-6;
/// Bisection steps when solving for the firm-target release.
const FIRM_RELEASE_ITERATIONS: usize = 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SimulationConfig {
    /// Storage at the start of the operational year; NRL volume when unset
    #[validate(range(min = 0.0))]
    pub starting_storage: Option<f64>,
    /// Minimum environmental release per month (storage units)
    #[validate(range(min = 0.0))]
    pub min_release: f64,
    /// Firm output every month aims for; live storage is spread evenly over
    /// the dry run when neither this nor a monthly target is set
    #[validate(range(min = 0.0))]
    pub guaranteed_power_mw: Option<f64>,
    /// Per-month firm output, January first; takes precedence over
    /// `guaranteed_power_mw`
    pub monthly_guaranteed_power_mw: Option<Vec<f64>>,
    /// Tailwater elevation used when the geometry has no rating curve (m)
    pub tailwater_elevation: f64,
    /// Cubic metres per storage unit (1e6 = hm³)
    #[validate(range(min = 1.0))]
    pub volume_unit_m3: f64,
    /// Calendar year used for month lengths
    #[validate(range(min = 1900, max = 2200))]
    pub reference_year: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            starting_storage: None,
            min_release: 0.0,
            guaranteed_power_mw: None,
            monthly_guaranteed_power_mw: None,
            tailwater_elevation: 0.0,
            volume_unit_m3: 1e6,
            reference_year: 2023,
        }
    }
}

impl SimulationConfig {
    /// Firm output configured for `month`, if any.
    pub fn power_target(&self, month: Month) -> Option<f64> {
        self.monthly_guaranteed_power_mw
            .as_ref()
            .and_then(|targets| targets.get(month.number_from_month() as usize - 1).copied())
            .or(self.guaranteed_power_mw)
    }
}

/// Plant-side result of passing a release through the turbines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthHydraulics {
    pub tailwater_elevation: f64,
    pub head: f64,
    pub discharge: f64,
    pub turbine_discharge: f64,
    pub turbine_release: f64,
    pub spill: f64,
    pub power_mw: f64,
    pub energy_mwh: f64,
}

/// Outcome of bounding a proposed release.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct BoundedRelease {
    pub release: f64,
    pub shortfall: f64,
    pub storage_end: f64,
    pub flags: Vec<ConstraintFlag>,
}

pub struct ReservoirSimulator<'a> {
    geometry: &'a Geometry,
    levels: &'a StaticLevels,
    interpolator: &'a dyn Interpolator,
    formulas: Formulas,
    config: &'a SimulationConfig,
    nrl_volume: f64,
    min_volume: f64,
    starting_storage: f64,
}

impl<'a> ReservoirSimulator<'a> {
    /// Validate inputs against each other. Any error here means no month is
    /// simulated.
    pub fn new(
        geometry: &'a Geometry,
        levels: &'a StaticLevels,
        interpolator: &'a dyn Interpolator,
        formulas: Formulas,
        config: &'a SimulationConfig,
    ) -> Result<Self> {
        let (z_lo, z_hi) = geometry.elevation_range();
        if levels.min_level() < z_lo || levels.nrl() > z_hi {
            return Err(PlanningError::InvalidLevels(format!(
                "levels {}..{} m fall outside the calibrated elevation range {}..{} m",
                levels.min_level(),
                levels.nrl(),
                z_lo,
                z_hi
            )));
        }
        if !(config.volume_unit_m3.is_finite() && config.volume_unit_m3 > 0.0) {
            return Err(PlanningError::InvalidLevels(format!(
                "volume unit must be positive, got {}",
                config.volume_unit_m3
            )));
        }

        if let Some(targets) = &config.monthly_guaranteed_power_mw {
            if targets.len() != MONTHS_PER_YEAR {
                return Err(PlanningError::InvalidSeries(format!(
                    "expected {} monthly power targets, got {}",
                    MONTHS_PER_YEAR,
                    targets.len()
                )));
            }
            if let Some(bad) = targets.iter().find(|p| !p.is_finite() || **p < 0.0) {
                return Err(PlanningError::InvalidSeries(format!(
                    "power targets must be finite and non-negative, got {}",
                    bad
                )));
            }
        }

        let nrl_volume = geometry.volume_at_elevation(interpolator, levels.nrl());
        let min_volume = geometry.volume_at_elevation(interpolator, levels.min_level());

        let starting_storage = config.starting_storage.unwrap_or(nrl_volume);
        if !starting_storage.is_finite() || starting_storage < 0.0 {
            return Err(PlanningError::InvalidLevels(format!(
                "starting storage must be finite and non-negative, got {}",
                starting_storage
            )));
        }

        // Storage never drops below min(start, floor), and tailwater never
        // rises above the rating curve's top, so this bounds every head.
        let lowest_storage = starting_storage.min(min_volume);
        let highest_tailwater = geometry
            .max_tailwater()
            .unwrap_or(config.tailwater_elevation);
        formulas.head(geometry, interpolator, lowest_storage, highest_tailwater)?;

        Ok(Self {
            geometry,
            levels,
            interpolator,
            formulas,
            config,
            nrl_volume,
            min_volume,
            starting_storage,
        })
    }

    pub fn nrl_volume(&self) -> f64 {
        self.nrl_volume
    }

    pub fn min_volume(&self) -> f64 {
        self.min_volume
    }

    pub fn starting_storage(&self) -> f64 {
        self.starting_storage
    }

    pub fn config(&self) -> &SimulationConfig {
        self.config
    }

    pub fn month_hours(&self, month: Month) -> f64 {
        hours_in_month(self.config.reference_year, month)
    }

    /// Firm output asked of `month`, never above installed capacity.
    pub fn power_target(&self, month: Month) -> Option<f64> {
        self.config
            .power_target(month)
            .map(|p| p.min(self.levels.installed_capacity_mw()))
    }

    /// Smallest release whose power, taken at the head that release leaves
    /// behind, reaches `target_mw`. Capped at what keeps storage at the
    /// floor. Bisection assumes power grows with release over that range.
    pub(crate) fn release_for_power(&self, available: f64, target_mw: f64, hours: f64) -> Result<f64> {
        let feasible_max = (available - self.min_volume).max(0.0);
        if target_mw <= 0.0 || feasible_max <= 0.0 {
            return Ok(0.0);
        }
        let power = |release: f64| {
            self.hydraulics(available - release, release, hours)
                .map(|h| h.power_mw)
        };
        if power(feasible_max)? < target_mw {
            return Ok(feasible_max);
        }

        let (mut lo, mut hi) = (0.0, feasible_max);
        for _ in 0..FIRM_RELEASE_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if power(mid)? >= target_mw {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        Ok(hi)
    }

    fn tailwater(&self, discharge: f64) -> f64 {
        self.geometry
            .tailwater_at(self.interpolator, discharge)
            .unwrap_or(self.config.tailwater_elevation)
    }

    /// Turbine the part of `release` the units can pass at end-of-month
    /// storage `storage_end`; the remainder is spilled.
    pub(crate) fn hydraulics(&self, storage_end: f64, release: f64, hours: f64) -> Result<MonthHydraulics> {
        let discharge = volume_to_discharge(release, self.config.volume_unit_m3, hours);
        let tailwater_elevation = self.tailwater(discharge);
        let head = self
            .formulas
            .head(self.geometry, self.interpolator, storage_end, tailwater_elevation)?;

        let capacity = self.levels.installed_capacity_mw();
        let turbine_discharge = discharge.min(self.formulas.discharge_for_power(capacity, head));
        let power_mw = self.formulas.power(turbine_discharge, head).min(capacity);

        let turbine_release = if discharge > 0.0 {
            release * (turbine_discharge / discharge)
        } else {
            0.0
        };

        Ok(MonthHydraulics {
            tailwater_elevation,
            head,
            discharge,
            turbine_discharge,
            turbine_release,
            spill: (release - turbine_release).max(0.0),
            power_mw,
            energy_mwh: Formulas::energy(power_mw, hours),
        })
    }

    pub(crate) fn bound_release(&self, desired: f64, available: f64) -> BoundedRelease {
        let crest = (available - self.nrl_volume).max(0.0);
        let required = desired.max(self.config.min_release).max(crest);
        let feasible_max = (available - self.min_volume).max(0.0);

        let mut flags = Vec::new();
        let (release, shortfall) = if required > feasible_max {
            (feasible_max, required - feasible_max)
        } else {
            (required, 0.0)
        };
        if shortfall > VOLUME_TOLERANCE {
            flags.push(ConstraintFlag::UnmetRelease);
        }

        let storage_end =
            (available - release).clamp(self.min_volume.min(available), self.nrl_volume.max(self.min_volume));
        if storage_end < self.min_volume - VOLUME_TOLERANCE {
            if !flags.contains(&ConstraintFlag::UnmetRelease) {
                flags.push(ConstraintFlag::UnmetRelease);
            }
            flags.push(ConstraintFlag::StorageFloorBreach);
        }

        BoundedRelease {
            release,
            shortfall,
            storage_end,
            flags,
        }
    }

    /// Simulate the twelve months of `year` under `policy`.
    pub fn run(&self, year: &OperatingYear, policy: &dyn ReleasePolicy) -> Result<SimulationState> {
        if year.len() != MONTHS_PER_YEAR {
            return Err(PlanningError::InvalidSeries(format!(
                "operational year must have {} months, got {}",
                MONTHS_PER_YEAR,
                year.len()
            )));
        }

        info!(
            policy = policy.name(),
            start_month = year.start_month().name(),
            starting_storage = self.starting_storage,
            nrl_volume = self.nrl_volume,
            min_volume = self.min_volume,
            "starting reservoir simulation"
        );

        let mut state = SimulationState::new(
            policy.name(),
            self.starting_storage,
            self.geometry.elevation_at(self.interpolator, self.starting_storage),
        );

        for (index, (entry, &regime)) in year.series().iter().zip(year.regimes()).enumerate() {
            let hours = self.month_hours(entry.month);
            let storage = state.storage();
            let available = storage + entry.inflow;

            let power_target = self.power_target(entry.month);
            let firm_release = power_target
                .map(|target| self.release_for_power(available, target, hours))
                .transpose()?;

            let ctx = MonthContext {
                index,
                month: entry.month,
                regime,
                inflow: entry.inflow,
                storage,
                available,
                nrl_volume: self.nrl_volume,
                min_volume: self.min_volume,
                hours,
                firm_release,
                remaining_in_run: year.remaining_in_run(index),
                next_regime: year.next_other_regime(index),
            };

            let desired = policy.desired_release(&ctx);
            let desired = if desired.is_finite() { desired.max(0.0) } else { 0.0 };
            let bounded = self.bound_release(desired, available);
            let hydraulics = self.hydraulics(bounded.storage_end, bounded.release, hours)?;

            let mut flags = bounded.flags;
            if hydraulics.spill > VOLUME_TOLERANCE {
                flags.push(ConstraintFlag::Spilled);
            }
            if power_target.is_some_and(|target| hydraulics.power_mw < target - POWER_TOLERANCE) {
                flags.push(ConstraintFlag::PowerShortfall);
            }
            flags.sort();

            let record = MonthRecord {
                month: entry.month,
                regime,
                inflow: entry.inflow,
                release: bounded.release,
                turbine_release: hydraulics.turbine_release,
                spill: hydraulics.spill,
                unmet_release: bounded.shortfall,
                storage_start: storage,
                storage_end: bounded.storage_end,
                elevation: self.geometry.elevation_at(self.interpolator, bounded.storage_end),
                surface_area: self.geometry.area_at(self.interpolator, bounded.storage_end),
                tailwater_elevation: hydraulics.tailwater_elevation,
                head: hydraulics.head,
                discharge: hydraulics.discharge,
                turbine_discharge: hydraulics.turbine_discharge,
                power_mw: hydraulics.power_mw,
                power_target_mw: power_target,
                hours,
                energy_mwh: hydraulics.energy_mwh,
                flags,
            };

            debug!(
                month = record.month.name(),
                regime = %record.regime,
                release = record.release,
                storage_end = record.storage_end,
                head = record.head,
                power_mw = record.power_mw,
                "month simulated"
            );
            if !record.flags.is_empty() {
                warn!(
                    month = record.month.name(),
                    flags = ?record.flags,
                    unmet_release = record.unmet_release,
                    spill = record.spill,
                    "constraint violation recorded"
                );
            }

            state.advance(record);
        }

        info!(
            policy = policy.name(),
            annual_energy_mwh = state.annual_energy_mwh(),
            final_storage = state.final_storage(),
            flagged_months = state.flagged_months(),
            "reservoir simulation complete"
        );

        Ok(state)
    }
}
