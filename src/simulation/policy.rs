//! Release policies: how much water a month should let go of before the
//! simulator applies the physical and regulatory bounds.

use chrono::Month;

use crate::domain::Regime;

/// Everything a policy may look at when deciding a month's release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonthContext {
    /// Position in the operational year (0 = first rotated month)
    pub index: usize,
    pub month: Month,
    pub regime: Regime,
    pub inflow: f64,
    /// Storage at the start of the month
    pub storage: f64,
    /// Storage plus inflow
    pub available: f64,
    pub nrl_volume: f64,
    pub min_volume: f64,
    pub hours: f64,
    /// Smallest release whose power at the end-of-month head meets the
    /// month's firm target, capped at what the floor allows
    pub firm_release: Option<f64>,
    /// Months left in the current regime run, this one included
    pub remaining_in_run: usize,
    /// Next different regime, wrapping around the year
    pub next_regime: Option<Regime>,
}

pub trait ReleasePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Release volume the policy asks for. The simulator enforces the
    /// minimum release, the NRL crest and the storage floor afterwards.
    fn desired_release(&self, ctx: &MonthContext) -> f64;
}

/// Rule-based release heuristic keyed on the month's regime.
///
/// - Flood: fill up to NRL, release whatever would overtop it
/// - Dry: release the firm target, or spread live storage over the dry run
///   when no target is set
/// - Normal: follow a straight line toward the level the next regime needs
///
/// Outside dry months a firm target acts as a lower bound on the release.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegimeReleasePolicy;

impl RegimeReleasePolicy {
    fn dry_release(&self, ctx: &MonthContext) -> f64 {
        if let Some(firm) = ctx.firm_release {
            return firm;
        }
        let live = (ctx.storage - ctx.min_volume).max(0.0);
        let spread = ctx.inflow + live / ctx.remaining_in_run.max(1) as f64;
        spread.min((ctx.available - ctx.min_volume).max(0.0))
    }

    fn normal_release(&self, ctx: &MonthContext) -> f64 {
        // Empty the live storage ahead of a flood season, keep it full ahead of a dry one.
        let goal = match ctx.next_regime {
            Some(Regime::Flood) => ctx.min_volume,
            _ => ctx.nrl_volume,
        };
        let target_end = ctx.storage + (goal - ctx.storage) / ctx.remaining_in_run.max(1) as f64;
        (ctx.available - target_end).max(0.0)
    }
}

impl ReleasePolicy for RegimeReleasePolicy {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn desired_release(&self, ctx: &MonthContext) -> f64 {
        let firm = ctx.firm_release.unwrap_or(0.0);
        match ctx.regime {
            Regime::Flood => (ctx.available - ctx.nrl_volume).max(0.0).max(firm),
            Regime::Dry => self.dry_release(ctx),
            Regime::Normal => self.normal_release(ctx).max(firm),
        }
    }
}

/// Fixed release per month, e.g. a schedule produced by an optimizer.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledReleasePolicy {
    releases: Vec<f64>,
    label: &'static str,
}

impl ScheduledReleasePolicy {
    pub fn new(releases: Vec<f64>) -> Self {
        Self::labelled(releases, "scheduled")
    }

    pub fn labelled(releases: Vec<f64>, label: &'static str) -> Self {
        Self { releases, label }
    }

    pub fn releases(&self) -> &[f64] {
        &self.releases
    }
}

impl ReleasePolicy for ScheduledReleasePolicy {
    fn name(&self) -> &'static str {
        self.label
    }

    fn desired_release(&self, ctx: &MonthContext) -> f64 {
        self.releases.get(ctx.index).copied().unwrap_or(0.0)
    }
}
