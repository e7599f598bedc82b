use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use validator::Validate;

use super::{GreedyHeuristic, OperatingStrategy, PlanInputs};
use crate::error::Result;
use crate::simulation::{ReservoirSimulator, ScheduledReleasePolicy, SimulationState};

/// Releases may undershoot zero by this much from rounding.
const RELEASE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DynamicProgrammingConfig {
    /// Storage intervals between the minimum-level and NRL volumes
    #[validate(range(min = 2, max = 2000))]
    pub storage_steps: usize,
    /// End the year as close to the starting storage as the grid allows
    pub close_cycle: bool,
}

impl Default for DynamicProgrammingConfig {
    fn default() -> Self {
        Self {
            storage_steps: 48,
            close_cycle: true,
        }
    }
}

/// Lexicographic path cost: unmet minimum release, then shortfall against
/// the firm power target, then negated energy.
type Cost = (OrderedFloat<f64>, OrderedFloat<f64>, OrderedFloat<f64>);

#[derive(Debug, Clone, Copy)]
struct Node {
    cost: Cost,
    prev: usize,
    release: f64,
    storage: f64,
}

/// Forward dynamic programming over a discretised storage grid.
///
/// Layer 0 holds the exact starting storage; layers 1..=12 hold the grid
/// `V_min + k·ΔV` plus one extra slot for storage still below the floor,
/// which only a start below the minimum level can reach. A transition
/// releases whatever moves storage from one node to the next and is scored
/// with the simulator's own hydraulics.
pub struct DynamicProgrammingOptimizer {
    config: DynamicProgrammingConfig,
}

impl Default for DynamicProgrammingOptimizer {
    fn default() -> Self {
        Self::new(DynamicProgrammingConfig::default())
    }
}

impl DynamicProgrammingOptimizer {
    pub fn new(config: DynamicProgrammingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DynamicProgrammingConfig {
        &self.config
    }

    fn grid(&self, simulator: &ReservoirSimulator<'_>) -> Vec<f64> {
        let steps = self.config.storage_steps.max(1);
        let lo = simulator.min_volume();
        let step = (simulator.nrl_volume() - lo) / steps as f64;
        (0..=steps).map(|k| lo + k as f64 * step).collect()
    }

    /// Release schedule of the best path, or `None` when no terminal node
    /// can be reached.
    fn search(&self, inputs: &PlanInputs<'_>, simulator: &ReservoirSimulator<'_>) -> Result<Option<Vec<f64>>> {
        let grid = self.grid(simulator);
        let below_floor = grid.len();
        let start = simulator.starting_storage();
        let min_volume = simulator.min_volume();
        let min_release = simulator.config().min_release;
        let entries = inputs.year.series().entries();

        let mut layers: Vec<Vec<Option<Node>>> = Vec::with_capacity(entries.len() + 1);
        layers.push(vec![Some(Node {
            cost: (OrderedFloat(0.0), OrderedFloat(0.0), OrderedFloat(0.0)),
            prev: 0,
            release: 0.0,
            storage: start,
        })]);

        for (t, entry) in entries.iter().enumerate() {
            let hours = simulator.month_hours(entry.month);
            let target = simulator.power_target(entry.month);
            let mut next: Vec<Option<Node>> = vec![None; grid.len() + 1];

            let step_cost = |from: &Node, storage_end: f64, release: f64| -> Result<Cost> {
                let hydraulics = simulator.hydraulics(storage_end, release, hours)?;
                let unmet = (min_release - release).max(0.0);
                let shortfall = target.map_or(0.0, |p| (p - hydraulics.power_mw).max(0.0));
                Ok((
                    OrderedFloat(from.cost.0 .0 + unmet),
                    OrderedFloat(from.cost.1 .0 + shortfall),
                    OrderedFloat(from.cost.2 .0 - hydraulics.energy_mwh),
                ))
            };

            for (i, node) in layers[t].iter().enumerate() {
                let Some(node) = node else { continue };
                let available = node.storage + entry.inflow;

                if available < min_volume {
                    // Nothing can be released until inflow lifts storage past the floor.
                    let cost = step_cost(node, available, 0.0)?;
                    next[below_floor] = Some(Node {
                        cost,
                        prev: i,
                        release: 0.0,
                        storage: available,
                    });
                    continue;
                }

                // Anything below this would be raised by the simulator on replay.
                let lowest_release = min_release.min(available - min_volume);
                for (k, &storage_end) in grid.iter().enumerate() {
                    let release = available - storage_end;
                    if release < -RELEASE_TOLERANCE || release < lowest_release - RELEASE_TOLERANCE {
                        continue;
                    }
                    let release = release.max(0.0);
                    let cost = step_cost(node, storage_end, release)?;
                    if next[k].map_or(true, |n| cost < n.cost) {
                        next[k] = Some(Node {
                            cost,
                            prev: i,
                            release,
                            storage: storage_end,
                        });
                    }
                }
            }
            layers.push(next);
        }

        let terminal = layers
            .last()
            .into_iter()
            .flatten()
            .enumerate()
            .filter_map(|(k, node)| node.map(|n| (k, n)));
        let best = if self.config.close_cycle {
            terminal.min_by_key(|(_, n)| (OrderedFloat((n.storage - start).abs()), n.cost))
        } else {
            terminal.min_by_key(|(_, n)| n.cost)
        };
        let Some((mut k, last)) = best else {
            return Ok(None);
        };

        let mut releases = vec![0.0; entries.len()];
        for t in (1..layers.len()).rev() {
            let Some(node) = layers[t][k] else {
                return Ok(None);
            };
            releases[t - 1] = node.release;
            k = node.prev;
        }

        debug!(
            end_storage = last.storage,
            power_shortfall_mw = last.cost.1 .0,
            steps = self.config.storage_steps,
            "storage grid search finished"
        );
        Ok(Some(releases))
    }
}

impl OperatingStrategy for DynamicProgrammingOptimizer {
    fn name(&self) -> &'static str {
        "dynamic"
    }

    fn plan(&self, inputs: &PlanInputs<'_>) -> Result<SimulationState> {
        let simulator = inputs.simulator()?;
        match self.search(inputs, &simulator)? {
            Some(releases) => {
                let policy = ScheduledReleasePolicy::labelled(releases, self.name());
                simulator.run(inputs.year, &policy)
            }
            None => {
                warn!(
                    starting_storage = simulator.starting_storage(),
                    min_volume = simulator.min_volume(),
                    "no reachable storage path, falling back to greedy heuristic"
                );
                GreedyHeuristic.plan(inputs)
            }
        }
    }
}
