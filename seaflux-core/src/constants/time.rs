//! Time Constants
//!
//! Sample spacing limits used to split a series into runs.

/// Largest gap between two consecutive readings that still counts as one
/// continuous run, in seconds.
///
/// Underway instruments typically log every few seconds to a minute. Sensors
/// that sleep between bursts leave gaps of tens of minutes to hours, well
/// clear of this limit.
pub const CONTINUITY_THRESHOLD_SECS: i64 = 300;

/// Seconds in one hour.
pub const SECONDS_PER_HOUR: i64 = 3600;

/// Default continuity threshold as a [`chrono::Duration`].
pub fn continuity_threshold() -> chrono::Duration {
    chrono::Duration::seconds(CONTINUITY_THRESHOLD_SECS)
}
