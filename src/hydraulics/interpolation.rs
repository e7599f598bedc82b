//! Curve tables and the interpolation strategies evaluated over them.
//!
//! Every interpolator clamps: a query below the first sample returns the
//! first ordinate, a query above the last sample returns the last one.
//! Reservoir curves are calibrated over a finite range and are never
//! extrapolated.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PlanningError, Result};

/// Sampled monotone-in-x curve, validated on construction.
///
/// The Fritsch–Carlson tangents are computed once here, so cubic lookups
/// only pay for the segment search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCurve", into = "RawCurve")]
pub struct CurveTable {
    xs: Vec<f64>,
    ys: Vec<f64>,
    tangents: Vec<f64>,
}

#[derive(Serialize, Deserialize)]
struct RawCurve {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl TryFrom<RawCurve> for CurveTable {
    type Error = PlanningError;

    fn try_from(raw: RawCurve) -> Result<Self> {
        CurveTable::new(raw.xs, raw.ys)
    }
}

impl From<CurveTable> for RawCurve {
    fn from(table: CurveTable) -> Self {
        RawCurve { xs: table.xs, ys: table.ys }
    }
}

impl CurveTable {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(PlanningError::InvalidTable(format!(
                "abscissa and ordinate lengths differ ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(PlanningError::InvalidTable(format!(
                "at least two samples required, got {}",
                xs.len()
            )));
        }
        if let Some(bad) = xs.iter().chain(ys.iter()).find(|v| !v.is_finite()) {
            return Err(PlanningError::InvalidTable(format!(
                "non-finite sample value {}",
                bad
            )));
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(PlanningError::InvalidTable(format!(
                "abscissae must be strictly increasing (x[{}] = {}, x[{}] = {})",
                i,
                xs[i],
                i + 1,
                xs[i + 1]
            )));
        }
        let tangents = monotone_tangents(&xs, &ys);
        Ok(Self { xs, ys, tangents })
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Monotone cubic tangent at each sample.
    pub fn tangents(&self) -> &[f64] {
        &self.tangents
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.xs[0], self.xs[self.xs.len() - 1])
    }

    /// Smallest and largest ordinate in the table.
    pub fn y_bounds(&self) -> (f64, f64) {
        self.ys
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &y| (lo.min(y), hi.max(y)))
    }

    /// Index `i` such that `xs[i - 1] < x < xs[i]`; only valid strictly inside the range.
    fn segment(&self, x: f64) -> usize {
        self.xs.partition_point(|&v| v <= x)
    }

    /// Boundary ordinate when `x` falls outside (or on the edge of) the range.
    fn clamped(&self, x: f64) -> Option<f64> {
        let n = self.xs.len();
        if x.is_nan() {
            return Some(f64::NAN);
        }
        if x <= self.xs[0] {
            return Some(self.ys[0]);
        }
        if x >= self.xs[n - 1] {
            return Some(self.ys[n - 1]);
        }
        None
    }
}

/// Interpolation capability. Implementations must clamp outside the table
/// range and pass exactly through every sample.
pub trait Interpolator: Send + Sync + fmt::Debug {
    fn evaluate(&self, table: &CurveTable, x: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// Piecewise-linear interpolation.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl Interpolator for LinearInterpolator {
    fn evaluate(&self, table: &CurveTable, x: f64) -> f64 {
        if let Some(y) = table.clamped(x) {
            return y;
        }
        let i = table.segment(x);
        let (x0, x1) = (table.xs[i - 1], table.xs[i]);
        let (y0, y1) = (table.ys[i - 1], table.ys[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}

/// Monotone piecewise-cubic Hermite interpolation (Fritsch–Carlson).
///
/// Preserves monotonicity of the samples, so a storage-elevation curve
/// stays non-decreasing between samples.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonotoneCubicInterpolator;

impl Interpolator for MonotoneCubicInterpolator {
    fn evaluate(&self, table: &CurveTable, x: f64) -> f64 {
        if let Some(y) = table.clamped(x) {
            return y;
        }
        let i = table.segment(x);
        let m = &table.tangents;
        let (x0, x1) = (table.xs[i - 1], table.xs[i]);
        let (y0, y1) = (table.ys[i - 1], table.ys[i]);
        let h = x1 - x0;
        let t = (x - x0) / h;
        let t2 = t * t;
        let t3 = t2 * t;

        let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
        let h10 = t3 - 2.0 * t2 + t;
        let h01 = -2.0 * t3 + 3.0 * t2;
        let h11 = t3 - t2;

        h00 * y0 + h10 * h * m[i - 1] + h01 * y1 + h11 * h * m[i]
    }

    fn name(&self) -> &'static str {
        "monotone_cubic"
    }
}

fn monotone_tangents(xs: &[f64], ys: &[f64]) -> Vec<f64> {
    let n = xs.len();
    let secants: Vec<f64> = (0..n - 1)
        .map(|k| (ys[k + 1] - ys[k]) / (xs[k + 1] - xs[k]))
        .collect();

    let mut m = vec![0.0; n];
    m[0] = secants[0];
    m[n - 1] = secants[n - 2];
    for k in 1..n - 1 {
        m[k] = if secants[k - 1] * secants[k] <= 0.0 {
            0.0
        } else {
            0.5 * (secants[k - 1] + secants[k])
        };
    }

    for k in 0..n - 1 {
        let d = secants[k];
        if d == 0.0 {
            m[k] = 0.0;
            m[k + 1] = 0.0;
            continue;
        }
        let alpha = m[k] / d;
        let beta = m[k + 1] / d;
        let norm = alpha * alpha + beta * beta;
        if norm > 9.0 {
            let tau = 3.0 / norm.sqrt();
            m[k] = tau * alpha * d;
            m[k + 1] = tau * beta * d;
        }
    }
    m
}

static LINEAR: LinearInterpolator = LinearInterpolator;
static MONOTONE_CUBIC: MonotoneCubicInterpolator = MonotoneCubicInterpolator;

/// Interpolator selection as it appears in configuration.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum InterpolationKind {
    #[default]
    Linear,
    MonotoneCubic,
}

impl InterpolationKind {
    pub fn interpolator(self) -> &'static dyn Interpolator {
        match self {
            InterpolationKind::Linear => &LINEAR,
            InterpolationKind::MonotoneCubic => &MONOTONE_CUBIC,
        }
    }
}
