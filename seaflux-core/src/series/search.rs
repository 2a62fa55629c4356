//! Point-in-time and window queries over a frozen series
//!
//! Both queries are pure binary searches over the derived points or raw
//! readings; there is no cursor state between calls. "No data" is `Ok(None)`,
//! never an error.
//!
//! ```text
//! derived:   P0 ──── P1 ──── P2 ───────── P3 ──── P4
//!                         ▲ t
//!            prior side ◄─┘└─► next side
//! ```
//!
//! In continuous mode each side scans outward, within the continuity threshold
//! of `t`, for the best-quality point it can find. The nearest point on a side
//! is kept even beyond the threshold when nothing better exists. In periodic
//! mode the sides are simply the neighbouring groups, and a time anywhere
//! inside a burst resolves to that burst.

use chrono::{DateTime, Utc};

use super::averaging;
use super::mode::MeasurementMode;
use super::TimeSeries;
use crate::derived::{resolve_candidates, DerivedPoint};
use crate::errors::ResolveResult;
use crate::values::RawPoint;

/// One side of an interpolation
struct Side<'a> {
    point: &'a DerivedPoint,
    skipped_better: bool,
}

impl<'a> Side<'a> {
    fn candidate(&self) -> DerivedPoint {
        self.point.clone().marked(self.skipped_better)
    }
}

impl TimeSeries {
    /// Value at `time`.
    ///
    /// `time` matches a derived point when it falls inside the point's span:
    /// the reading itself in continuous mode, the whole burst in periodic
    /// mode. A good match is returned unchanged, and without
    /// `allow_interpolation` only matches are returned. A non-good match is
    /// bridged by good neighbours when both sides are good, replaced by the
    /// better single side when that side outranks it, and kept otherwise.
    /// Between points the neighbours are interpolated when both are good; if
    /// not, the better single side is returned, marked as interpolated.
    pub fn value_at(
        &self,
        time: DateTime<Utc>,
        allow_interpolation: bool,
    ) -> ResolveResult<Option<DerivedPoint>> {
        let Some(index) = self.matching(time) else {
            return if allow_interpolation {
                resolve_candidates(time, self.interpolation_candidates(time))
            } else {
                Ok(None)
            };
        };

        let point = &self.outputs[index];
        if point.flag().is_good() || !allow_interpolation {
            return Ok(Some(point.clone()));
        }

        let (prior, next) = self.sides_between(time, index, index + 1);
        if let (Some(p), Some(n)) = (&prior, &next) {
            if self.bridgeable(p, n) {
                let value = DerivedPoint::interpolate(&p.candidate(), &n.candidate(), time)?;
                return Ok(Some(value.marked(true)));
            }
        }
        match better_side(time, prior, next) {
            Some(side) if side.point.flag().is_better_than(point.flag()) => {
                Ok(Some(side.point.as_interpolated()))
            }
            _ => Ok(Some(point.clone())),
        }
    }

    /// Candidates for interpolation at `time`: none, the better single side,
    /// or both sides when both are good
    pub fn interpolation_candidates(&self, time: DateTime<Utc>) -> Vec<DerivedPoint> {
        let before = self.outputs.partition_point(|p| p.nominal_time() < time);
        let after = self.outputs.partition_point(|p| p.nominal_time() <= time);
        let (prior, next) = self.sides_between(time, before, after);

        if let (Some(p), Some(n)) = (&prior, &next) {
            if self.bridgeable(p, n) {
                return vec![p.candidate(), n.candidate()];
            }
        }
        better_side(time, prior, next)
            .map(|side| side.point.as_interpolated())
            .into_iter()
            .collect()
    }

    /// Value for an externally supplied window.
    ///
    /// Averages the raw readings in `[start, end]` at their best quality tier,
    /// bypassing automatic grouping. An empty window falls back to
    /// [`value_at`](Self::value_at) at `nominal` when interpolation is allowed.
    pub fn value_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        nominal: DateTime<Utc>,
        allow_interpolation: bool,
    ) -> ResolveResult<Option<DerivedPoint>> {
        let members: Vec<&RawPoint> = self
            .raw_between(start, end)
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| p.is_usable())
            .collect();

        if !members.is_empty() {
            let value = if self.textual {
                averaging::tiered_text(&members, true)
            } else {
                averaging::tiered_average(&members, true)
            };
            if value.is_some() {
                return Ok(value);
            }
        }

        if allow_interpolation {
            self.value_at(nominal, true)
        } else {
            Ok(None)
        }
    }

    /// Derived point whose span contains `time`
    fn matching(&self, time: DateTime<Utc>) -> Option<usize> {
        let index = self.outputs.partition_point(|p| p.end() < time);
        self.outputs
            .get(index)
            .filter(|p| p.start() <= time)
            .map(|_| index)
    }

    fn bridgeable(&self, prior: &Side<'_>, next: &Side<'_>) -> bool {
        !self.textual && prior.point.flag().is_good() && next.point.flag().is_good()
    }

    /// Sides around `time`, drawn from `outputs[..before]` and `outputs[after..]`
    fn sides_between(
        &self,
        time: DateTime<Utc>,
        before: usize,
        after: usize,
    ) -> (Option<Side<'_>>, Option<Side<'_>>) {
        match self.mode {
            MeasurementMode::Periodic => (
                before.checked_sub(1).map(|i| Side {
                    point: &self.outputs[i],
                    skipped_better: false,
                }),
                self.outputs.get(after).map(|point| Side {
                    point,
                    skipped_better: false,
                }),
            ),
            MeasurementMode::Continuous => (
                self.scan(time, self.outputs[..before].iter().rev()),
                self.scan(time, self.outputs[after..].iter()),
            ),
        }
    }

    /// Walk outward from `time`, keeping the nearest point and replacing it
    /// only with a strictly better one found within the continuity threshold
    fn scan<'a, I>(&self, time: DateTime<Utc>, mut points: I) -> Option<Side<'a>>
    where
        I: Iterator<Item = &'a DerivedPoint>,
    {
        let nearest = points.next()?;
        let mut best = nearest;

        for point in points {
            let distance = if point.nominal_time() > time {
                point.nominal_time() - time
            } else {
                time - point.nominal_time()
            };
            if distance > self.continuity_threshold {
                break;
            }
            if point.flag().is_better_than(best.flag()) {
                best = point;
            }
            if best.flag().is_good() {
                break;
            }
        }

        Some(Side {
            point: best,
            skipped_better: !std::ptr::eq(best, nearest),
        })
    }
}

/// Better-flagged side; equal flags go to the closer side, then to prior
fn better_side<'a>(
    time: DateTime<Utc>,
    prior: Option<Side<'a>>,
    next: Option<Side<'a>>,
) -> Option<Side<'a>> {
    match (prior, next) {
        (None, None) => None,
        (Some(side), None) | (None, Some(side)) => Some(side),
        (Some(p), Some(n)) => {
            let prior_wins = if p.point.flag().is_better_than(n.point.flag()) {
                true
            } else if n.point.flag().is_better_than(p.point.flag()) {
                false
            } else {
                time - p.point.nominal_time() <= n.point.nominal_time() - time
            };
            Some(if prior_wins { p } else { n })
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::constants::SECONDS_PER_HOUR;
    use crate::flags::QualityFlag;
    use crate::series::{MeasurementMode, TimeSeries, TimeSeriesBuilder};
    use crate::values::{ColumnId, DatasetId, RawPoint, RawPointId, RawValue};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap() + Duration::seconds(secs)
    }

    fn series(readings: &[(i64, f64, QualityFlag)]) -> TimeSeries {
        let mut builder = TimeSeriesBuilder::new("sst".into(), [ColumnId(1)]);
        for (i, (secs, value, flag)) in readings.iter().enumerate() {
            builder
                .insert(
                    RawPoint::new(
                        RawPointId(i as u64),
                        DatasetId(1),
                        ColumnId(1),
                        t(*secs),
                        RawValue::Numeric(*value),
                    )
                    .with_flag(*flag, ""),
                )
                .unwrap();
        }
        builder.build()
    }

    #[test]
    fn exact_good_match_is_returned_unchanged() {
        let s = series(&[
            (0, 1.0, QualityFlag::Good),
            (60, 2.0, QualityFlag::Good),
            (120, 3.0, QualityFlag::Good),
        ]);
        let v = s.value_at(t(60), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 2.0);
        assert_eq!(v.member_count(), 1);
        assert!(!v.interpolates_across_flags());
    }

    #[test]
    fn no_exact_match_without_interpolation_is_none() {
        let s = series(&[(0, 1.0, QualityFlag::Good), (60, 2.0, QualityFlag::Good)]);
        assert_eq!(s.value_at(t(30), false).unwrap(), None);
    }

    #[test]
    fn continuous_scan_skips_bad_neighbour() {
        let s = series(&[
            (0, 0.0, QualityFlag::Good),
            (60, 6.0, QualityFlag::Good),
            (120, 100.0, QualityFlag::Bad),
            (180, 18.0, QualityFlag::Good),
        ]);
        assert_eq!(s.mode(), MeasurementMode::Continuous);

        let v = s.value_at(t(150), true).unwrap().unwrap();
        assert!((v.numeric().unwrap() - 15.0).abs() < 1e-9);
        assert!(v.interpolates_across_flags());
        assert_eq!(v.flag(), QualityFlag::Good);
    }

    #[test]
    fn differing_flags_return_better_side() {
        let s = series(&[
            (0, 1.0, QualityFlag::Questionable),
            (60, 2.0, QualityFlag::Good),
            (120, 3.0, QualityFlag::Bad),
        ]);
        let v = s.value_at(t(90), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 2.0);
        assert!(v.interpolates_across_flags());
    }

    #[test]
    fn equal_flags_prefer_closer_side() {
        let s = series(&[(0, 1.0, QualityFlag::Bad), (60, 2.0, QualityFlag::Bad)]);
        assert_eq!(s.value_at(t(50), true).unwrap().unwrap().numeric().unwrap(), 2.0);
        assert_eq!(s.value_at(t(10), true).unwrap().unwrap().numeric().unwrap(), 1.0);
    }

    #[test]
    fn beyond_either_end_uses_single_side() {
        let s = series(&[(0, 1.0, QualityFlag::Good), (60, 2.0, QualityFlag::Good)]);
        let v = s.value_at(t(600), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 2.0);
        assert!(v.interpolates_across_flags());
    }

    #[test]
    fn exact_bad_match_is_bridged_by_good_neighbours() {
        let s = series(&[
            (0, 10.0, QualityFlag::Good),
            (60, 99.0, QualityFlag::Bad),
            (120, 20.0, QualityFlag::Good),
        ]);
        let v = s.value_at(t(60), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 15.0);
        assert!(v.interpolates_across_flags());

        let exact = s.value_at(t(60), false).unwrap().unwrap();
        assert_eq!(exact.numeric().unwrap(), 99.0);
    }

    #[test]
    fn non_good_match_yields_to_better_side() {
        let s = series(&[
            (0, 10.0, QualityFlag::Good),
            (60, 99.0, QualityFlag::Questionable),
            (120, 50.0, QualityFlag::Bad),
        ]);
        let v = s.value_at(t(60), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 10.0);
        assert_eq!(v.flag(), QualityFlag::Good);
        assert!(v.interpolates_across_flags());
    }

    #[test]
    fn non_good_match_kept_when_sides_are_worse() {
        let s = series(&[
            (0, 10.0, QualityFlag::Bad),
            (60, 99.0, QualityFlag::Questionable),
            (120, 50.0, QualityFlag::Bad),
        ]);
        let v = s.value_at(t(60), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 99.0);
        assert!(!v.interpolates_across_flags());
    }

    fn two_bursts() -> TimeSeries {
        let mut readings: Vec<(i64, f64, QualityFlag)> =
            (0..5).map(|i| (i * 10, 10.0, QualityFlag::Good)).collect();
        readings.extend((0..5).map(|i| (4 * SECONDS_PER_HOUR + i * 10, 20.0, QualityFlag::Good)));
        series(&readings)
    }

    #[test]
    fn time_inside_burst_resolves_to_that_burst() {
        let s = two_bursts();
        assert_eq!(s.mode(), MeasurementMode::Periodic);

        for secs in [0, 10, 20, 30, 40] {
            let v = s.value_at(t(secs), true).unwrap().unwrap();
            assert_eq!(v.numeric().unwrap(), 10.0);
            assert_eq!(v.member_count(), 5);
            assert!(!v.interpolates_across_flags());
            assert_eq!(s.value_at(t(secs), false).unwrap(), Some(v));
        }
        let last = s.value_at(t(4 * SECONDS_PER_HOUR + 35), true).unwrap().unwrap();
        assert_eq!(last.numeric().unwrap(), 20.0);
    }

    #[test]
    fn time_between_bursts_interpolates_groups() {
        let s = two_bursts();
        let midway = (20 + 4 * SECONDS_PER_HOUR + 20) / 2;
        let v = s.value_at(t(midway), true).unwrap().unwrap();
        assert!((v.numeric().unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(v.member_count(), 10);
        assert_eq!(s.value_at(t(midway), false).unwrap(), None);
    }

    #[test]
    fn empty_series_has_no_value() {
        let s = series(&[]);
        assert_eq!(s.value_at(t(0), true).unwrap(), None);
        assert!(s.interpolation_candidates(t(0)).is_empty());
    }

    #[test]
    fn window_averages_best_tier() {
        let s = series(&[
            (0, 10.0, QualityFlag::Good),
            (30, 50.0, QualityFlag::Bad),
            (60, 12.0, QualityFlag::Good),
            (600, 40.0, QualityFlag::Good),
        ]);
        let v = s.value_in_window(t(0), t(60), t(30), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 11.0);
        assert_eq!(v.member_count(), 2);
        assert!(v.interpolates_across_flags());
    }

    #[test]
    fn empty_window_falls_back_to_point_query() {
        let s = series(&[(0, 10.0, QualityFlag::Good), (120, 20.0, QualityFlag::Good)]);
        let v = s.value_in_window(t(50), t(70), t(60), true).unwrap().unwrap();
        assert_eq!(v.numeric().unwrap(), 15.0);
        assert_eq!(s.value_in_window(t(50), t(70), t(60), false).unwrap(), None);
    }
}
