use thiserror::Error;

/// Structural input errors. All of them are raised before (or at) the
/// start of a run; in-run infeasibility is reported through
/// [`crate::domain::ConstraintFlag`] instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    #[error("Invalid interpolation table: {0}")]
    InvalidTable(String),

    #[error("Invalid hydrological series: {0}")]
    InvalidSeries(String),

    #[error("Invalid plant levels: {0}")]
    InvalidLevels(String),

    #[error("Non-positive head {head:.3} m at storage {storage:.3}")]
    NegativeHead { storage: f64, head: f64 },
}

pub type Result<T, E = PlanningError> = std::result::Result<T, E>;
