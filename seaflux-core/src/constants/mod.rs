//! Constants for Seaflux Core
//!
//! Numeric defaults used by series grouping and value resolution. Every value
//! that can differ between instruments also has a field in
//! [`InstrumentConfig`](crate::config::InstrumentConfig); these are the
//! fallbacks used when a definition leaves it out.
//!
//! ## Organization
//!
//! - **Time**: continuity threshold and related durations
//! - **Grouping**: measurement-mode classification limits
//! - **Resolution**: nesting limit for composite resolvers

/// Time-related constants for sample spacing.
pub mod time;

/// Group size limits for measurement-mode detection.
pub mod grouping;

/// Resolver recursion limit.
pub mod resolution;

pub use time::{CONTINUITY_THRESHOLD_SECS, SECONDS_PER_HOUR};
pub use grouping::{LARGE_GROUP_SIZE, MAX_LARGE_GROUPS, MAX_MEAN_GROUP_SIZE};
pub use resolution::MAX_RESOLUTION_DEPTH;
