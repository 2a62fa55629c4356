//! Measurement-Mode Classification Limits
//!
//! A series is periodic when its readings arrive in short bursts. These limits
//! define "short".

/// A group with more members than this is a "large" group.
pub const LARGE_GROUP_SIZE: usize = 25;

/// Mean group size above which a series is continuous.
pub const MAX_MEAN_GROUP_SIZE: f64 = 25.0;

/// A periodic series may contain at most this many large groups.
///
/// Allows a handful of long bursts (e.g. an instrument left awake during a
/// port call) without flipping the whole series to continuous.
pub const MAX_LARGE_GROUPS: usize = 5;
