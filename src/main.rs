use anyhow::{Context, Result};
use reservoir_planner::{config::Config, planner::ReservoirPlanner, telemetry::init_tracing};
use tracing::info;

fn main() -> Result<()> {
    init_tracing();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    info!(scenario = %cfg.scenario.name, strategy = %cfg.engine.strategy, "starting reservoir planner");

    let inputs = cfg
        .scenario
        .into_inputs()
        .with_context(|| format!("building scenario '{}'", cfg.scenario.name))?;
    let planner = ReservoirPlanner::from_scenario(inputs, cfg.engine.clone());
    let report = planner.plan().context("planning operational year")?;

    info!(
        annual_energy_mwh = report.summary.annual_energy_mwh,
        flagged_months = report.summary.flagged_months,
        "plan complete"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
