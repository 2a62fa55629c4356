//! Derived points: resolved, possibly averaged values with provenance
//!
//! A [`DerivedPoint`] spans `[start, end]` with a nominal time at the midpoint
//! (all three coincide for a single reading). It records every raw point that
//! contributed and the flag/message those points imply. Derived points are
//! built only by [`TimeSeries`](crate::series::TimeSeries) and by the
//! interpolation routine in this module.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::{ResolveError, ResolveResult};
use crate::flags::QualityFlag;
use crate::stats;
use crate::values::{RawPoint, RawPointId, RawValue, ValueKind};

/// Value of a derived point
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivedValue {
    /// Numeric result
    Numeric(f64),
    /// Textual result
    Text(String),
}

impl DerivedValue {
    fn kind(&self) -> ValueKind {
        match self {
            Self::Numeric(_) => ValueKind::Numeric,
            Self::Text(_) => ValueKind::Text,
        }
    }
}

/// Immutable computed value with time span and provenance
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedPoint {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    nominal: DateTime<Utc>,
    sources: BTreeSet<RawPointId>,
    value: DerivedValue,
    flag: QualityFlag,
    message: String,
    interpolates_across_flags: bool,
}

impl DerivedPoint {
    /// Derived point for a single raw reading, or `None` if it has no value
    pub(crate) fn from_raw(point: &RawPoint) -> Option<Self> {
        let value = match &point.value {
            RawValue::Numeric(v) if v.is_finite() => DerivedValue::Numeric(*v),
            RawValue::Text(s) if !s.trim().is_empty() => DerivedValue::Text(s.clone()),
            _ => return None,
        };
        Some(Self {
            start: point.time,
            end: point.time,
            nominal: point.time,
            sources: BTreeSet::from([point.id]),
            value,
            flag: point.effective_flag(),
            message: point.message.clone(),
            interpolates_across_flags: false,
        })
    }

    /// Derived point covering a group of time-ordered raw readings
    pub(crate) fn from_group(
        members: &[&RawPoint],
        value: DerivedValue,
        flag: QualityFlag,
        message: String,
        interpolates_across_flags: bool,
    ) -> Option<Self> {
        let first = members.first()?;
        let last = members.last()?;
        Some(Self {
            start: first.time,
            end: last.time,
            nominal: stats::midpoint(first.time, last.time),
            sources: members.iter().map(|p| p.id).collect(),
            value,
            flag,
            message,
            interpolates_across_flags,
        })
    }

    /// Copy of this point marked as standing in for a value at another time
    pub(crate) fn as_interpolated(&self) -> Self {
        Self {
            interpolates_across_flags: true,
            ..self.clone()
        }
    }

    /// Copy of this point with the interpolation marker set to `skipped`
    pub(crate) fn marked(mut self, skipped: bool) -> Self {
        self.interpolates_across_flags |= skipped;
        self
    }

    /// Linear interpolation between two numeric points at `time`
    pub(crate) fn interpolate(
        prior: &DerivedPoint,
        next: &DerivedPoint,
        time: DateTime<Utc>,
    ) -> ResolveResult<Self> {
        let v0 = prior.numeric()?;
        let v1 = next.numeric()?;
        let value = stats::interpolate_at(prior.nominal, v0, next.nominal, v1, time);

        Ok(Self {
            start: prior.nominal,
            end: next.nominal,
            nominal: time,
            sources: prior.sources.union(&next.sources).copied().collect(),
            value: DerivedValue::Numeric(value),
            flag: prior.flag.combine(next.flag),
            message: join_messages([prior.message.as_str(), next.message.as_str()]),
            interpolates_across_flags: prior.interpolates_across_flags
                || next.interpolates_across_flags,
        })
    }

    /// Start of the covered span
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the covered span
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Time the value represents
    pub fn nominal_time(&self) -> DateTime<Utc> {
        self.nominal
    }

    /// Contributing raw point ids
    pub fn sources(&self) -> &BTreeSet<RawPointId> {
        &self.sources
    }

    /// Number of raw points folded into the value
    pub fn member_count(&self) -> usize {
        self.sources.len()
    }

    /// Value
    pub fn value(&self) -> &DerivedValue {
        &self.value
    }

    /// QC flag
    pub fn flag(&self) -> QualityFlag {
        self.flag
    }

    /// QC message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// True if a better or differently flagged reading was passed over
    pub fn interpolates_across_flags(&self) -> bool {
        self.interpolates_across_flags
    }

    /// Numeric value or `ValueTypeMismatch`
    pub fn numeric(&self) -> ResolveResult<f64> {
        match &self.value {
            DerivedValue::Numeric(v) => Ok(*v),
            other => Err(ResolveError::ValueTypeMismatch {
                expected: ValueKind::Numeric,
                found: other.kind(),
            }),
        }
    }

    /// Text value or `ValueTypeMismatch`
    pub fn text(&self) -> ResolveResult<&str> {
        match &self.value {
            DerivedValue::Text(s) => Ok(s),
            other => Err(ResolveError::ValueTypeMismatch {
                expected: ValueKind::Text,
                found: other.kind(),
            }),
        }
    }
}

/// Reduce interpolation candidates to a single value.
///
/// No candidates means no value; one is returned as is; two are linearly
/// interpolated to `time`. Anything else is a search defect.
pub fn resolve_candidates(
    time: DateTime<Utc>,
    mut candidates: Vec<DerivedPoint>,
) -> ResolveResult<Option<DerivedPoint>> {
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(candidates.pop()),
        2 => {
            let next = &candidates[1];
            let prior = &candidates[0];
            DerivedPoint::interpolate(prior, next, time).map(Some)
        }
        count => Err(ResolveError::UnexpectedCandidateCount { count }),
    }
}

/// Join distinct, non-empty QC messages
pub(crate) fn join_messages<'a, I: IntoIterator<Item = &'a str>>(messages: I) -> String {
    let mut seen: Vec<&str> = Vec::new();
    for message in messages {
        let message = message.trim();
        if !message.is_empty() && !seen.contains(&message) {
            seen.push(message);
        }
    }
    seen.join("; ")
}
