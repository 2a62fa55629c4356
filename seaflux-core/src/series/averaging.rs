//! Quality-tiered averaging
//!
//! When several readings describe one value, only the best quality present is
//! used: Good/AssumedGood if any exist, else Questionable, else Bad.
//!
//! ```text
//! members:  G  G  Q  B  G      chosen tier: Good
//! used:     G  G        G      value = mean of the three G readings
//! ```
//!
//! Callers that query an externally supplied window ask for the result to be
//! marked when lower-quality readings were left out.

use crate::derived::{join_messages, DerivedPoint, DerivedValue};
use crate::flags::worst;
use crate::stats;
use crate::values::RawPoint;

/// Members of the best quality tier present, plus whether any were left out
pub fn best_tier<'a>(members: &[&'a RawPoint]) -> (Vec<&'a RawPoint>, bool) {
    let chosen = members
        .iter()
        .filter_map(|p| p.effective_flag().tier())
        .min();

    let Some(chosen) = chosen else {
        return (Vec::new(), !members.is_empty());
    };

    let used: Vec<&RawPoint> = members
        .iter()
        .copied()
        .filter(|p| p.effective_flag().tier() == Some(chosen))
        .collect();
    let skipped = used.len() < members.len();
    (used, skipped)
}

/// Average numeric members at their best quality tier.
///
/// Members without a numeric value are ignored. Returns `None` when nothing
/// usable remains.
pub fn tiered_average(members: &[&RawPoint], mark_skipped: bool) -> Option<DerivedPoint> {
    let numeric: Vec<&RawPoint> = members
        .iter()
        .copied()
        .filter(|p| p.is_usable() && p.value.as_f64().is_some())
        .collect();

    let (used, skipped) = best_tier(&numeric);
    let values: Vec<f64> = used.iter().filter_map(|p| p.value.as_f64()).collect();
    let value = stats::mean(&values)?;
    let flag = worst(used.iter().map(|p| p.effective_flag()))?;
    let message = join_messages(used.iter().map(|p| p.message.as_str()));

    DerivedPoint::from_group(
        &used,
        DerivedValue::Numeric(value),
        flag,
        message,
        mark_skipped && skipped,
    )
}

/// Mean of the members at their best quality tier
pub fn tiered_mean(members: &[&RawPoint]) -> Option<f64> {
    tiered_average(members, false).and_then(|p| p.numeric().ok())
}

/// Collapse textual members to the first reading of the best tier.
///
/// Text is never averaged; the result carries the first used member's value,
/// flag and message.
pub fn tiered_text(members: &[&RawPoint], mark_skipped: bool) -> Option<DerivedPoint> {
    let textual: Vec<&RawPoint> = members
        .iter()
        .copied()
        .filter(|p| p.is_usable() && p.value.as_text().is_some())
        .collect();

    let (used, skipped) = best_tier(&textual);
    let first = used.first()?;
    let value = DerivedValue::Text(first.value.as_text()?.to_string());

    DerivedPoint::from_group(
        &used,
        value,
        first.effective_flag(),
        first.message.clone(),
        mark_skipped && skipped,
    )
}
