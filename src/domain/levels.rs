use serde::Serialize;

use crate::error::{PlanningError, Result};

/// Plant design levels and installed capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StaticLevels {
    /// Normal retention level (m)
    nrl: f64,
    /// Minimum operating (dead-storage) level (m)
    min_level: f64,
    /// Installed capacity (MW)
    installed_capacity_mw: f64,
}

impl StaticLevels {
    pub fn new(nrl: f64, min_level: f64, installed_capacity_mw: f64) -> Result<Self> {
        if !(nrl.is_finite() && min_level.is_finite() && installed_capacity_mw.is_finite()) {
            return Err(PlanningError::InvalidLevels(
                "levels and installed capacity must be finite".to_string(),
            ));
        }
        if nrl <= min_level {
            return Err(PlanningError::InvalidLevels(format!(
                "normal retention level {} must be above minimum level {}",
                nrl, min_level
            )));
        }
        if installed_capacity_mw <= 0.0 {
            return Err(PlanningError::InvalidLevels(format!(
                "installed capacity must be positive, got {} MW",
                installed_capacity_mw
            )));
        }
        Ok(Self {
            nrl,
            min_level,
            installed_capacity_mw,
        })
    }

    pub fn nrl(&self) -> f64 {
        self.nrl
    }

    pub fn min_level(&self) -> f64 {
        self.min_level
    }

    pub fn installed_capacity_mw(&self) -> f64 {
        self.installed_capacity_mw
    }
}
