use serde::Serialize;

use crate::error::{PlanningError, Result};
use crate::hydraulics::{CurveTable, Interpolator};

const BISECTION_ITERATIONS: usize = 80;

/// Reservoir and river-reach geometry.
///
/// Holds the storage-elevation curve and, optionally, the storage-area
/// curve and the tailwater rating curve (plant discharge to downstream
/// water level). All curves are immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Geometry {
    elevation: CurveTable,
    area: Option<CurveTable>,
    tailwater: Option<CurveTable>,
}

impl Geometry {
    /// Build from paired storage volumes and forebay elevations.
    pub fn new(volumes: Vec<f64>, elevations: Vec<f64>) -> Result<Self> {
        if let Some(i) = elevations.windows(2).position(|w| w[1] < w[0]) {
            return Err(PlanningError::InvalidTable(format!(
                "elevation decreases between samples {} and {} ({} -> {})",
                i,
                i + 1,
                elevations[i],
                elevations[i + 1]
            )));
        }
        Ok(Self {
            elevation: CurveTable::new(volumes, elevations)?,
            area: None,
            tailwater: None,
        })
    }

    /// Attach surface areas sampled at the same volumes as the elevation curve.
    pub fn with_areas(mut self, areas: Vec<f64>) -> Result<Self> {
        if let Some(a) = areas.iter().find(|a| **a < 0.0) {
            return Err(PlanningError::InvalidTable(format!("negative surface area {}", a)));
        }
        self.area = Some(CurveTable::new(self.elevation.xs().to_vec(), areas)?);
        Ok(self)
    }

    /// Attach a tailwater rating curve: discharge (m³/s) to tailwater elevation (m).
    pub fn with_tailwater_curve(mut self, discharges: Vec<f64>, elevations: Vec<f64>) -> Result<Self> {
        self.tailwater = Some(CurveTable::new(discharges, elevations)?);
        Ok(self)
    }

    pub fn elevation_curve(&self) -> &CurveTable {
        &self.elevation
    }

    pub fn has_tailwater_curve(&self) -> bool {
        self.tailwater.is_some()
    }

    pub fn elevation_at(&self, interpolator: &dyn Interpolator, volume: f64) -> f64 {
        interpolator.evaluate(&self.elevation, volume)
    }

    pub fn area_at(&self, interpolator: &dyn Interpolator, volume: f64) -> Option<f64> {
        self.area.as_ref().map(|t| interpolator.evaluate(t, volume))
    }

    pub fn tailwater_at(&self, interpolator: &dyn Interpolator, discharge: f64) -> Option<f64> {
        self.tailwater.as_ref().map(|t| interpolator.evaluate(t, discharge))
    }

    /// Highest tailwater elevation the rating curve can return.
    pub fn max_tailwater(&self) -> Option<f64> {
        self.tailwater.as_ref().map(|t| t.y_bounds().1)
    }

    pub fn volume_range(&self) -> (f64, f64) {
        self.elevation.x_range()
    }

    pub fn elevation_range(&self) -> (f64, f64) {
        let ys = self.elevation.ys();
        (ys[0], ys[ys.len() - 1])
    }

    /// Lowest storage volume whose elevation reaches `elevation`.
    ///
    /// Solved by bisection through the same interpolator used for the
    /// forward curve, so `elevation_at(volume_at_elevation(z)) == z` up to
    /// the bisection tolerance. Clamps to the calibrated volume range.
    pub fn volume_at_elevation(&self, interpolator: &dyn Interpolator, elevation: f64) -> f64 {
        let (v_lo, v_hi) = self.volume_range();
        let (z_lo, z_hi) = self.elevation_range();
        if elevation <= z_lo {
            return v_lo;
        }
        if elevation > z_hi {
            return v_hi;
        }

        let (mut lo, mut hi) = (v_lo, v_hi);
        for _ in 0..BISECTION_ITERATIONS {
            let mid = 0.5 * (lo + hi);
            if self.elevation_at(interpolator, mid) >= elevation {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        hi
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hydraulics::{LinearInterpolator, MonotoneCubicInterpolator};

    fn geometry() -> Geometry {
        Geometry::new(vec![0.0, 1000.0], vec![100.0, 120.0]).unwrap()
    }

    #[test]
    fn test_rejects_decreasing_elevation() {
        let err = Geometry::new(vec![0.0, 1.0, 2.0], vec![10.0, 12.0, 11.0]).unwrap_err();
        assert!(matches!(err, PlanningError::InvalidTable(_)));
    }

    #[test]
    fn test_rejects_single_sample() {
        assert!(Geometry::new(vec![0.0], vec![10.0]).is_err());
    }

    #[test]
    fn test_elevation_lookup() {
        let g = geometry();
        assert!((g.elevation_at(&LinearInterpolator, 850.0) - 117.0).abs() < 1e-12);
        assert_eq!(g.elevation_at(&LinearInterpolator, -10.0), 100.0);
        assert_eq!(g.elevation_at(&LinearInterpolator, 5000.0), 120.0);
    }

    #[test]
    fn test_inverse_lookup() {
        let g = geometry();
        assert!((g.volume_at_elevation(&LinearInterpolator, 118.0) - 900.0).abs() < 1e-6);
        assert!((g.volume_at_elevation(&LinearInterpolator, 102.0) - 100.0).abs() < 1e-6);
        assert_eq!(g.volume_at_elevation(&LinearInterpolator, 90.0), 0.0);
        assert_eq!(g.volume_at_elevation(&LinearInterpolator, 130.0), 1000.0);
    }

    #[test]
    fn test_inverse_picks_lowest_volume_on_flat_segment() {
        let g = Geometry::new(vec![0.0, 10.0, 20.0, 30.0], vec![1.0, 5.0, 5.0, 9.0]).unwrap();
        let v = g.volume_at_elevation(&LinearInterpolator, 5.0);
        assert!((v - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_inverse_through_cubic_round_trips() {
        let g = Geometry::new(
            vec![0.1, 0.4, 0.9, 2.3, 4.6, 8.8, 14.6, 21.0, 29.3],
            vec![87.0, 89.0, 91.0, 93.0, 95.0, 97.0, 99.0, 101.0, 103.0],
        )
        .unwrap();
        let interp = MonotoneCubicInterpolator;
        let v = g.volume_at_elevation(&interp, 100.0);
        assert!((g.elevation_at(&interp, v) - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_optional_curves() {
        let g = geometry()
            .with_areas(vec![0.0, 50.0])
            .unwrap()
            .with_tailwater_curve(vec![0.0, 500.0], vec![5.0, 10.0])
            .unwrap();
        assert_eq!(g.area_at(&LinearInterpolator, 500.0), Some(25.0));
        assert_eq!(g.tailwater_at(&LinearInterpolator, 250.0), Some(7.5));
        assert_eq!(g.max_tailwater(), Some(10.0));
        assert!(geometry().area_at(&LinearInterpolator, 1.0).is_none());
        assert!(geometry().with_areas(vec![0.0, -1.0]).is_err());
        assert!(geometry().with_areas(vec![0.0]).is_err());
    }
}
