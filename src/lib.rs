//! Monthly operation planner for a single hydropower reservoir.
//!
//! Given the reservoir's volume-elevation curve, its operating levels and a
//! twelve-month inflow series, the planner classifies months into flood,
//! normal and dry regimes, rotates the year to start with the filling
//! season and simulates storage, head, power and energy month by month
//! under a chosen operating strategy.

pub mod config;
pub mod domain;
pub mod error;
pub mod hydraulics;
pub mod optimizer;
pub mod planner;
pub mod simulation;
pub mod telemetry;

pub use error::{PlanningError, Result};
