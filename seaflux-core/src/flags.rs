//! Quality Flags
//!
//! Every raw reading and every derived value carries a [`QualityFlag`].
//!
//! ## Ranking
//!
//! ```text
//! Good ─┐
//!       ├─ tier 0 (best)
//! AssumedGood ─┘
//! Questionable ── tier 1
//! Bad ─────────── tier 2 (worst)
//! Flushing ────── not ranked, excluded from every calculation
//! Needed ──────── defers to the automatic QC flag
//! ```
//!
//! Combining two flags keeps the more significant one. Within tier 0,
//! `AssumedGood` is kept over `Good` so a value built partly from unchecked
//! readings never claims to be fully checked.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// QC status of a raw or derived value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Checked and good
    Good,
    /// Not checked, no reason to doubt it
    AssumedGood,
    /// Usable with caution
    Questionable,
    /// Not usable
    Bad,
    /// Instrument was flushing; the reading is not a measurement
    Flushing,
    /// User review requested; the automatic QC result applies meanwhile
    Needed,
}

/// Quality tier used when choosing which readings to average
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QualityTier {
    /// Good or AssumedGood
    Good,
    /// Questionable
    Questionable,
    /// Bad
    Bad,
}

impl QualityTier {
    /// Tiers in order of preference
    pub const PREFERENCE: [QualityTier; 3] = [Self::Good, Self::Questionable, Self::Bad];
}

impl QualityFlag {
    /// Resolve `Needed` against an automatic QC flag.
    ///
    /// With no automatic flag a `Needed` reading is treated as `AssumedGood`.
    pub fn effective(self, auto_flag: Option<QualityFlag>) -> QualityFlag {
        match self {
            Self::Needed => match auto_flag {
                Some(Self::Needed) | None => Self::AssumedGood,
                Some(flag) => flag,
            },
            flag => flag,
        }
    }

    /// Quality tier, or `None` for flags that never take part in calculations
    pub fn tier(self) -> Option<QualityTier> {
        match self {
            Self::Good | Self::AssumedGood | Self::Needed => Some(QualityTier::Good),
            Self::Questionable => Some(QualityTier::Questionable),
            Self::Bad => Some(QualityTier::Bad),
            Self::Flushing => None,
        }
    }

    /// Good or AssumedGood
    pub fn is_good(self) -> bool {
        matches!(self, Self::Good | Self::AssumedGood)
    }

    /// Flushing readings are dropped before any calculation
    pub fn is_excluded(self) -> bool {
        self == Self::Flushing
    }

    /// Position in the combining order. Higher wins.
    fn severity(self) -> u8 {
        match self {
            Self::Good => 0,
            Self::AssumedGood | Self::Needed => 1,
            Self::Questionable => 2,
            Self::Bad => 3,
            Self::Flushing => 4,
        }
    }

    /// The more significant of two flags
    pub fn combine(self, other: QualityFlag) -> QualityFlag {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }

    /// True if `self` ranks strictly better than `other`
    pub fn is_better_than(self, other: QualityFlag) -> bool {
        match (self.tier(), other.tier()) {
            (Some(a), Some(b)) => a < b,
            (Some(_), None) => true,
            _ => false,
        }
    }

    /// Lower-case name as used in configuration and exports
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::AssumedGood => "assumed_good",
            Self::Questionable => "questionable",
            Self::Bad => "bad",
            Self::Flushing => "flushing",
            Self::Needed => "needed",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for QualityFlag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "good" => Ok(Self::Good),
            "assumed_good" => Ok(Self::AssumedGood),
            "questionable" => Ok(Self::Questionable),
            "bad" => Ok(Self::Bad),
            "flushing" => Ok(Self::Flushing),
            "needed" => Ok(Self::Needed),
            other => Err(format!("unknown quality flag '{}'", other)),
        }
    }
}

/// Fold an iterator of flags into the most significant one
pub fn worst<I: IntoIterator<Item = QualityFlag>>(flags: I) -> Option<QualityFlag> {
    flags.into_iter().reduce(QualityFlag::combine)
}
