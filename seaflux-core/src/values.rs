//! Raw sensor readings
//!
//! A [`RawPoint`] is one timestamped reading from one column of an instrument
//! file. Points are created by ingestion and only read here, apart from flag
//! rewrites applied through [`FlagUpdate`] before a dataset index is frozen.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{ResolveError, ResolveResult};
use crate::flags::QualityFlag;

/// Stable identifier of a raw point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawPointId(pub u64);

/// Dataset a raw point belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub u64);

/// Source column (file column or sensor channel) of a raw point
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnId(pub u64);

impl fmt::Display for RawPointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type of a value, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Floating point reading
    Numeric,
    /// Textual reading (status strings, run types)
    Text,
    /// No reading
    Absent,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Absent => "absent",
        })
    }
}

/// Value of a raw reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawValue {
    /// Numeric reading; never NaN (see [`RawValue::from_f64`])
    Numeric(f64),
    /// Textual reading
    Text(String),
    /// Empty cell or missing reading
    Absent,
}

impl RawValue {
    /// Numeric value, mapping NaN and infinities to `Absent`
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Numeric(value)
        } else {
            Self::Absent
        }
    }

    /// Text value, mapping empty strings to `Absent`
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Absent
        } else {
            Self::Text(value)
        }
    }

    /// Value type
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Numeric(_) => ValueKind::Numeric,
            Self::Text(_) => ValueKind::Text,
            Self::Absent => ValueKind::Absent,
        }
    }

    /// True when there is no usable reading
    pub fn is_absent(&self) -> bool {
        match self {
            Self::Numeric(v) => !v.is_finite(),
            Self::Text(s) => s.trim().is_empty(),
            Self::Absent => true,
        }
    }

    /// Numeric reading, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Numeric(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }

    /// Textual reading, if any
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One timestamped reading from one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    /// Stable identifier
    pub id: RawPointId,
    /// Owning dataset
    pub dataset_id: DatasetId,
    /// Source column
    pub column: ColumnId,
    /// Reading time, unique within the point's series
    pub time: DateTime<Utc>,
    /// Reading
    pub value: RawValue,
    /// User or producer QC flag
    pub flag: QualityFlag,
    /// Automatic QC flag; applies while `flag` is `Needed`
    pub auto_flag: Option<QualityFlag>,
    /// QC message accompanying the flag
    pub message: String,
}

impl RawPoint {
    /// New point flagged `AssumedGood` with no message
    pub fn new(
        id: RawPointId,
        dataset_id: DatasetId,
        column: ColumnId,
        time: DateTime<Utc>,
        value: RawValue,
    ) -> Self {
        Self {
            id,
            dataset_id,
            column,
            time,
            value,
            flag: QualityFlag::AssumedGood,
            auto_flag: None,
            message: String::new(),
        }
    }

    /// Builder-style flag setter
    pub fn with_flag(mut self, flag: QualityFlag, message: impl Into<String>) -> Self {
        self.flag = flag;
        self.message = message.into();
        self
    }

    /// Builder-style automatic QC flag setter
    pub fn with_auto_flag(mut self, auto_flag: QualityFlag) -> Self {
        self.auto_flag = Some(auto_flag);
        self
    }

    /// Flag used for all calculations
    pub fn effective_flag(&self) -> QualityFlag {
        self.flag.effective(self.auto_flag)
    }

    /// True if the point takes part in calculations at all
    pub fn is_usable(&self) -> bool {
        !self.value.is_absent() && !self.effective_flag().is_excluded()
    }

    /// Numeric reading or `ValueTypeMismatch`
    pub fn numeric(&self) -> ResolveResult<f64> {
        self.value.as_f64().ok_or(ResolveError::ValueTypeMismatch {
            expected: ValueKind::Numeric,
            found: self.value.kind(),
        })
    }

    /// Rewrite the QC flag. The only mutation a raw point allows.
    pub fn set_flag(&mut self, flag: QualityFlag, message: impl Into<String>) {
        self.flag = flag;
        self.message = message.into();
    }
}

/// Flag rewrite produced by flushing or zero detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagUpdate {
    /// Point to rewrite
    pub id: RawPointId,
    /// New flag
    pub flag: QualityFlag,
    /// New message
    pub message: String,
}

impl FlagUpdate {
    /// Create a flag update
    pub fn new(id: RawPointId, flag: QualityFlag, message: impl Into<String>) -> Self {
        Self {
            id,
            flag,
            message: message.into(),
        }
    }
}
