use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use super::{OperatingStrategy, PlanInputs};
use crate::error::Result;
use crate::simulation::{OperatingYear, ReservoirSimulator, ScheduledReleasePolicy, SimulationState};

/// End-storage gaps are compared at this fraction of the live range, so
/// rounding noise never outranks energy.
const GAP_RESOLUTION: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct GreyWolfConfig {
    /// Candidate trajectories per iteration
    #[validate(range(min = 3, max = 1000))]
    pub pack_size: usize,
    #[validate(range(min = 1, max = 100_000))]
    pub iterations: usize,
    /// Same seed, same plan
    pub seed: u64,
    /// Pin the last month's end storage to the starting storage
    pub close_cycle: bool,
}

impl Default for GreyWolfConfig {
    fn default() -> Self {
        Self {
            pack_size: 20,
            iterations: 400,
            seed: 0,
            close_cycle: true,
        }
    }
}

/// Lexicographic score: unmet minimum release, squared shortfall against
/// the firm power target, distance from the starting storage at year end,
/// negated energy.
type Score = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

#[derive(Debug, Clone)]
struct Evaluation {
    score: Score,
    releases: Vec<f64>,
}

/// Grey Wolf metaheuristic over end-of-month storages.
///
/// Each wolf is a vector of twelve target storages between the floor and
/// NRL. Every iteration the three best wolves lead: each coordinate moves
/// to the mean of three pulls toward the leaders, with an exploration
/// factor that decays linearly from 2 to 0. Wolves are scored by walking
/// them through the simulator's own bounds and hydraulics; the best one
/// seen is replayed as a fixed release schedule.
pub struct GreyWolfOptimizer {
    config: GreyWolfConfig,
}

impl Default for GreyWolfOptimizer {
    fn default() -> Self {
        Self::new(GreyWolfConfig::default())
    }
}

impl GreyWolfOptimizer {
    pub fn new(config: GreyWolfConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GreyWolfConfig {
        &self.config
    }

    fn evaluate(&self, year: &OperatingYear, simulator: &ReservoirSimulator<'_>, ends: &[f64]) -> Result<Evaluation> {
        let start = simulator.starting_storage();
        let mut storage = start;
        let mut releases = Vec::with_capacity(ends.len());
        let (mut unmet, mut shortfall, mut energy) = (0.0, 0.0, 0.0);

        for (entry, &end) in year.series().iter().zip(ends) {
            let hours = simulator.month_hours(entry.month);
            let available = storage + entry.inflow;
            let bounded = simulator.bound_release((available - end).max(0.0), available);
            let hydraulics = simulator.hydraulics(bounded.storage_end, bounded.release, hours)?;

            unmet += bounded.shortfall;
            if let Some(target) = simulator.power_target(entry.month) {
                shortfall += (target - hydraulics.power_mw).max(0.0).powi(2);
            }
            energy += hydraulics.energy_mwh;
            releases.push(bounded.release);
            storage = bounded.storage_end;
        }

        let gap = if self.config.close_cycle {
            let span = (simulator.nrl_volume() - simulator.min_volume()).max(f64::MIN_POSITIVE);
            ((storage - start).abs() / span / GAP_RESOLUTION).round()
        } else {
            0.0
        };

        Ok(Evaluation {
            score: (
                OrderedFloat(unmet),
                OrderedFloat(shortfall),
                OrderedFloat(gap),
                OrderedFloat(-energy),
            ),
            releases,
        })
    }

    fn pin(&self, wolf: &mut [f64], anchor: f64) {
        if self.config.close_cycle {
            if let Some(last) = wolf.last_mut() {
                *last = anchor;
            }
        }
    }

    /// Release schedule of the best wolf seen over all iterations.
    fn search(&self, inputs: &PlanInputs<'_>, simulator: &ReservoirSimulator<'_>) -> Result<Vec<f64>> {
        let year = inputs.year;
        let months = year.len();
        let (lo, hi) = (simulator.min_volume(), simulator.nrl_volume().max(simulator.min_volume()));
        let anchor = simulator.starting_storage().clamp(lo, hi);
        let pack_size = self.config.pack_size.max(1);
        let iterations = self.config.iterations;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut pack: Vec<Vec<f64>> = (0..pack_size)
            .map(|_| {
                let mut wolf: Vec<f64> = (0..months).map(|_| rng.gen_range(lo..=hi)).collect();
                self.pin(&mut wolf, anchor);
                wolf
            })
            .collect();

        let mut scores = pack
            .iter()
            .map(|wolf| self.evaluate(year, simulator, wolf))
            .collect::<Result<Vec<_>>>()?;
        let mut best = None;
        keep_best(&mut best, &scores);

        for it in 0..iterations {
            let mut order: Vec<usize> = (0..pack.len()).collect();
            order.sort_by_key(|&i| scores[i].score);
            let leaders: Vec<Vec<f64>> = (0..3)
                .map(|rank| pack[order[rank.min(order.len() - 1)]].clone())
                .collect();

            let a = if iterations > 1 {
                2.0 - 2.0 * it as f64 / (iterations - 1) as f64
            } else {
                0.0
            };

            for wolf in pack.iter_mut() {
                for j in 0..months {
                    let pulled: f64 = leaders
                        .iter()
                        .map(|leader| {
                            let r1: f64 = rng.gen();
                            let r2: f64 = rng.gen();
                            let step = a * (2.0 * r1 - 1.0);
                            let distance = (2.0 * r2 * leader[j] - wolf[j]).abs();
                            leader[j] - step * distance
                        })
                        .sum();
                    wolf[j] = (pulled / leaders.len() as f64).clamp(lo, hi);
                }
                self.pin(wolf, anchor);
            }

            scores = pack
                .iter()
                .map(|wolf| self.evaluate(year, simulator, wolf))
                .collect::<Result<Vec<_>>>()?;
            keep_best(&mut best, &scores);
        }

        let Some(best) = best else {
            return Ok(Vec::new());
        };

        debug!(
            pack_size,
            iterations,
            seed = self.config.seed,
            power_shortfall = best.score.1 .0,
            energy_mwh = -best.score.3 .0,
            "grey wolf search finished"
        );
        Ok(best.releases)
    }
}

fn keep_best(best: &mut Option<Evaluation>, scores: &[Evaluation]) {
    if let Some(candidate) = scores.iter().min_by_key(|e| e.score) {
        if best.as_ref().map_or(true, |b| candidate.score < b.score) {
            *best = Some(candidate.clone());
        }
    }
}

impl OperatingStrategy for GreyWolfOptimizer {
    fn name(&self) -> &'static str {
        "grey_wolf"
    }

    fn plan(&self, inputs: &PlanInputs<'_>) -> Result<SimulationState> {
        let simulator = inputs.simulator()?;
        let releases = self.search(inputs, &simulator)?;
        let policy = ScheduledReleasePolicy::labelled(releases, self.name());
        simulator.run(inputs.year, &policy)
    }
}
