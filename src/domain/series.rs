use chrono::Month;
use serde::Serialize;

use crate::error::{PlanningError, Result};

pub const MONTHS_PER_YEAR: usize = 12;

/// Inflow volume for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyInflow {
    pub month: Month,
    pub inflow: f64,
}

/// Twelve consecutive monthly inflows of one water year.
///
/// A freshly loaded series runs January to December. Rotation yields a new
/// series starting at another month; the source is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydrologicalSeries {
    entries: Vec<MonthlyInflow>,
}

pub fn month_from_number(number: u32) -> Result<Month> {
    u8::try_from(number)
        .ok()
        .and_then(|n| Month::try_from(n).ok())
        .ok_or_else(|| PlanningError::InvalidSeries(format!("month number {} outside 1..=12", number)))
}

impl HydrologicalSeries {
    /// Build from twelve inflows in calendar order, January first.
    pub fn from_calendar(inflows: &[f64]) -> Result<Self> {
        if inflows.len() != MONTHS_PER_YEAR {
            return Err(PlanningError::InvalidSeries(format!(
                "expected {} monthly inflows, got {}",
                MONTHS_PER_YEAR,
                inflows.len()
            )));
        }
        let entries = inflows
            .iter()
            .enumerate()
            .map(|(i, &inflow)| (i as u32 + 1, inflow))
            .collect();
        Self::from_entries(entries)
    }

    /// Build from `(month number, inflow)` pairs. Months must be distinct and
    /// consecutive (wrapping December to January).
    pub fn from_entries(entries: Vec<(u32, f64)>) -> Result<Self> {
        if entries.len() != MONTHS_PER_YEAR {
            return Err(PlanningError::InvalidSeries(format!(
                "expected {} monthly entries, got {}",
                MONTHS_PER_YEAR,
                entries.len()
            )));
        }

        let mut seen = [false; MONTHS_PER_YEAR];
        let mut out = Vec::with_capacity(MONTHS_PER_YEAR);
        for (number, inflow) in entries {
            let month = month_from_number(number)?;
            let slot = month.number_from_month() as usize - 1;
            if seen[slot] {
                return Err(PlanningError::InvalidSeries(format!(
                    "duplicate entry for {}",
                    month.name()
                )));
            }
            seen[slot] = true;
            if !inflow.is_finite() || inflow < 0.0 {
                return Err(PlanningError::InvalidSeries(format!(
                    "inflow for {} must be finite and non-negative, got {}",
                    month.name(),
                    inflow
                )));
            }
            out.push(MonthlyInflow { month, inflow });
        }

        if let Some(w) = out.windows(2).find(|w| w[0].month.succ() != w[1].month) {
            return Err(PlanningError::InvalidSeries(format!(
                "months out of order: {} followed by {}",
                w[0].month.name(),
                w[1].month.name()
            )));
        }

        Ok(Self { entries: out })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MonthlyInflow] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &MonthlyInflow> {
        self.entries.iter()
    }

    pub fn months(&self) -> Vec<Month> {
        self.entries.iter().map(|e| e.month).collect()
    }

    pub fn inflows(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.inflow).collect()
    }

    pub fn first_month(&self) -> Month {
        self.entries[0].month
    }

    pub fn inflow(&self, month: Month) -> f64 {
        self.entries
            .iter()
            .find(|e| e.month == month)
            .map(|e| e.inflow)
            .unwrap_or(0.0)
    }

    pub fn total_inflow(&self) -> f64 {
        self.entries.iter().map(|e| e.inflow).sum()
    }

    /// Position of `month` in this series' read order.
    pub fn position(&self, month: Month) -> usize {
        let offset = self.first_month().number_from_month();
        ((month.number_from_month() + 12 - offset) % 12) as usize
    }

    /// New series reading `start, start+1, ..` around the year.
    pub fn rotated_to(&self, start: Month) -> Self {
        let shift = self.position(start);
        let mut entries = self.entries.clone();
        entries.rotate_left(shift);
        Self { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> HydrologicalSeries {
        HydrologicalSeries::from_calendar(&[
            10.0, 10.0, 10.0, 10.0, 50.0, 80.0, 100.0, 80.0, 50.0, 20.0, 10.0, 10.0,
        ])
        .unwrap()
    }

    #[test]
    fn test_calendar_order() {
        let s = calendar();
        assert_eq!(s.len(), 12);
        assert_eq!(s.first_month(), Month::January);
        assert_eq!(s.inflow(Month::July), 100.0);
        assert_eq!(s.total_inflow(), 440.0);
    }

    #[test]
    fn test_wrong_length() {
        let err = HydrologicalSeries::from_calendar(&[1.0; 11]).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidSeries(_)));
        assert!(HydrologicalSeries::from_calendar(&[1.0; 13]).is_err());
    }

    #[test]
    fn test_negative_inflow() {
        let mut inflows = [1.0; 12];
        inflows[3] = -0.5;
        let err = HydrologicalSeries::from_calendar(&inflows).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidSeries(_)));
    }

    #[test]
    fn test_duplicate_and_out_of_range_months() {
        let mut entries: Vec<(u32, f64)> = (1..=12).map(|m| (m, 1.0)).collect();
        entries[11] = (11, 1.0);
        assert!(HydrologicalSeries::from_entries(entries).is_err());

        let mut entries: Vec<(u32, f64)> = (1..=12).map(|m| (m, 1.0)).collect();
        entries[0] = (13, 1.0);
        assert!(HydrologicalSeries::from_entries(entries).is_err());
    }

    #[test]
    fn test_entries_may_start_mid_year() {
        let entries: Vec<(u32, f64)> = (0..12).map(|i| ((i + 9) % 12 + 1, i as f64)).collect();
        let s = HydrologicalSeries::from_entries(entries).unwrap();
        assert_eq!(s.first_month(), Month::October);
        assert_eq!(s.inflow(Month::October), 0.0);
        assert_eq!(s.inflow(Month::September), 11.0);
    }

    #[test]
    fn test_rotation_leaves_source_untouched() {
        let s = calendar();
        let r = s.rotated_to(Month::February);
        assert_eq!(s.first_month(), Month::January);
        assert_eq!(r.first_month(), Month::February);
        assert_eq!(r.entries()[11].month, Month::January);
        assert_eq!(r.inflow(Month::July), 100.0);
        assert_eq!(r.rotated_to(Month::February), r);
        assert_eq!(r.rotated_to(Month::January), s);
    }
}
