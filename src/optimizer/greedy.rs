use super::{OperatingStrategy, PlanInputs};
use crate::error::Result;
use crate::simulation::{RegimeReleasePolicy, SimulationState};

/// Rule-based baseline: one forward pass of the simulator under the
/// regime release policy.
/// - Flood months fill to NRL and pass the surplus
/// - Dry months draw live storage down toward the floor
/// - Normal months steer toward what the next season needs
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyHeuristic;

impl OperatingStrategy for GreedyHeuristic {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn plan(&self, inputs: &PlanInputs<'_>) -> Result<SimulationState> {
        let simulator = inputs.simulator()?;
        simulator.run(inputs.year, &RegimeReleasePolicy)
    }
}
