//! Numeric helpers shared by series averaging and calibration
//!
//! All functions are pure and return `None` instead of dividing by zero.

use chrono::{DateTime, Duration, Utc};

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Mean of `(value, weight)` pairs. Zero-weight pairs are ignored.
pub fn weighted_mean<I: IntoIterator<Item = (f64, f64)>>(pairs: I) -> Option<f64> {
    let (sum, weight) = pairs
        .into_iter()
        .filter(|(_, w)| *w > 0.0)
        .fold((0.0, 0.0), |(s, tw), (v, w)| (s + v * w, tw + w));

    if weight > 0.0 {
        Some(sum / weight)
    } else {
        None
    }
}

/// Mean of a set of timestamps
pub fn mean_time(times: &[DateTime<Utc>]) -> Option<DateTime<Utc>> {
    let first = *times.first()?;
    let offset_ms = times
        .iter()
        .map(|t| (*t - first).num_milliseconds() as f64)
        .sum::<f64>()
        / times.len() as f64;
    Some(first + Duration::milliseconds(offset_ms.round() as i64))
}

/// Midpoint of two timestamps
pub fn midpoint(start: DateTime<Utc>, end: DateTime<Utc>) -> DateTime<Utc> {
    start + (end - start) / 2
}

/// Linear interpolation between `(t0, v0)` and `(t1, v1)` at `t`.
///
/// Equal times return the mean of the two values.
pub fn interpolate_at(
    t0: DateTime<Utc>,
    v0: f64,
    t1: DateTime<Utc>,
    v1: f64,
    t: DateTime<Utc>,
) -> f64 {
    let span = (t1 - t0).num_milliseconds() as f64;
    if span == 0.0 {
        return (v0 + v1) / 2.0;
    }
    let fraction = (t - t0).num_milliseconds() as f64 / span;
    v0 + (v1 - v0) * fraction
}

/// Least-squares line through `(x, y)` points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFit {
    /// Slope
    pub slope: f64,
    /// Intercept
    pub intercept: f64,
}

impl LinearFit {
    /// Fit a line. Needs two points with distinct `x`.
    pub fn fit(points: &[(f64, f64)]) -> Option<Self> {
        if points.len() < 2 {
            return None;
        }
        let n = points.len() as f64;
        let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;

        let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
        if sxx == 0.0 {
            return None;
        }
        let sxy: f64 = points
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();

        let slope = sxy / sxx;
        Some(Self {
            slope,
            intercept: mean_y - slope * mean_x,
        })
    }

    /// Predicted `y` at `x`
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}
