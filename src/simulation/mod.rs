//! # Reservoir Simulation Module
//!
//! Turns a hydrological series into a twelve-month operating trajectory.
//!
//! ## Components
//!
//! - **MonthSelector**: regime classification and operational-year rotation
//! - **ReleasePolicy**: per-month release decisions (regime heuristic or fixed schedule)
//! - **ReservoirSimulator**: mass balance, head, power and energy with constraint flags
//! - **SimulationState**: the trajectory and its summaries (annual energy, firm output)
//!
//! ## Usage
//!
//! ```rust
//! use reservoir_planner::domain::{Geometry, HydrologicalSeries, StaticLevels};
//! use reservoir_planner::hydraulics::{Formulas, LinearInterpolator};
//! use reservoir_planner::simulation::{
//!     MonthSelector, RegimeReleasePolicy, ReservoirSimulator, SimulationConfig,
//! };
//!
//! let geometry = Geometry::new(vec![0.0, 1000.0], vec![100.0, 120.0]).unwrap();
//! let levels = StaticLevels::new(118.0, 102.0, 50.0).unwrap();
//! let series = HydrologicalSeries::from_calendar(&[
//!     10.0, 10.0, 10.0, 10.0, 50.0, 80.0, 100.0, 80.0, 50.0, 20.0, 10.0, 10.0,
//! ])
//! .unwrap();
//! let config = SimulationConfig::default();
//!
//! let year = MonthSelector::default().select(&series);
//! let simulator = ReservoirSimulator::new(
//!     &geometry,
//!     &levels,
//!     &LinearInterpolator,
//!     Formulas::default(),
//!     &config,
//! )
//! .unwrap();
//! let state = simulator
//!     .run(&year, &RegimeReleasePolicy)
//!     .unwrap();
//!
//! assert_eq!(state.records().len(), 12);
//! ```

pub mod month_selector;
pub mod policy;
pub mod reservoir;
pub mod state;

pub use month_selector::{MonthSelector, OperatingYear, RegimeThresholds};
pub use policy::{MonthContext, RegimeReleasePolicy, ReleasePolicy, ScheduledReleasePolicy};
pub use reservoir::{ReservoirSimulator, SimulationConfig};
pub use state::{PlanSummary, SimulationState};
