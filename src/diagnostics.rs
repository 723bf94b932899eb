// Non-fatal findings collected while shaping a payload.
//
// Nothing in here ever aborts aggregation; the offending record is skipped
// (or loses to an earlier one) and the finding is kept so callers can
// surface it next to the chart.
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// A record lacks a field needed to derive its time bucket.
    MissingField { record: usize, field: String },
    /// A month outside 1..=12.
    InvalidMonth { record: usize, month: i64 },
    /// A year no calendar date can carry.
    InvalidYear { record: usize, year: i32 },
    /// Two records of one group landed in the same bucket; `record` lost.
    AmbiguousDuplicate {
        group: String,
        bucket: String,
        record: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingField { record, field } => {
                write!(f, "record {} has no '{}', excluded", record, field)
            }
            Diagnostic::InvalidMonth { record, month } => {
                write!(f, "record {} has invalid month {}, excluded", record, month)
            }
            Diagnostic::InvalidYear { record, year } => {
                write!(f, "record {} has invalid year {}, excluded", record, year)
            }
            Diagnostic::AmbiguousDuplicate {
                group,
                bucket,
                record,
            } => write!(
                f,
                "record {} duplicates bucket {} for '{}', first record kept",
                record, bucket, group
            ),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding and log it.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{}", diagnostic);
        self.items.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}
