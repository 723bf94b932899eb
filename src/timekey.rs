//! Canonical time buckets and the shared timeline.
//!
//! Monthly buckets render as `YYYY-MM`, yearly buckets as `YYYY`. Buckets
//! order by `(year, month-or-0)`, so a yearly bucket sorts just before the
//! monthly buckets of the same year. Callers must not mix granularities in
//! one dataset; the two key spaces never collide but the chart would be
//! meaningless.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::types::{Granularity, RawRecord};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeBucket {
    pub year: i32,
    /// 1..=12 for monthly buckets, `None` for yearly ones.
    pub month: Option<u32>,
}

impl TimeBucket {
    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    pub fn yearly(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{}-{:02}", self.year, m),
            None => write!(f, "{}", self.year),
        }
    }
}

impl Ord for TimeBucket {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.year, self.month.unwrap_or(0), self.month.is_some()).cmp(&(
            other.year,
            other.month.unwrap_or(0),
            other.month.is_some(),
        ))
    }
}

impl PartialOrd for TimeBucket {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A record that survived key derivation, with its position in the input.
#[derive(Debug, Clone, Copy)]
pub struct KeyedRecord<'a> {
    pub index: usize,
    pub bucket: TimeBucket,
    pub record: &'a RawRecord,
}

/// Derive the bucket of one record.
///
/// Without a year there is nothing to fall back to, so the record is
/// reported and excluded. A missing month keys the record by year alone.
pub fn bucket_for(
    index: usize,
    record: &RawRecord,
    granularity: Granularity,
    diags: &mut Diagnostics,
) -> Option<TimeBucket> {
    let Some(year) = record.year else {
        diags.push(Diagnostic::MissingField {
            record: index,
            field: "year".to_string(),
        });
        return None;
    };
    if granularity == Granularity::Yearly {
        return Some(TimeBucket::yearly(year));
    }
    let Some(raw_month) = record.month else {
        return Some(TimeBucket::yearly(year));
    };
    let Some(month) = u32::try_from(raw_month)
        .ok()
        .filter(|m| (1..=12).contains(m))
    else {
        diags.push(Diagnostic::InvalidMonth {
            record: index,
            month: raw_month,
        });
        return None;
    };
    if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
        diags.push(Diagnostic::InvalidYear {
            record: index,
            year,
        });
        return None;
    }
    Some(TimeBucket::monthly(year, month))
}

/// Key every record, dropping the ones that have no bucket.
pub fn key_records<'a>(
    records: &'a [RawRecord],
    granularity: Granularity,
    diags: &mut Diagnostics,
) -> Vec<KeyedRecord<'a>> {
    records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            bucket_for(index, record, granularity, diags).map(|bucket| KeyedRecord {
                index,
                bucket,
                record,
            })
        })
        .collect()
}

/// Strictly ascending, duplicate-free sequence of buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Timeline {
    buckets: Vec<TimeBucket>,
}

impl Timeline {
    pub fn from_buckets<I>(buckets: I) -> Self
    where
        I: IntoIterator<Item = TimeBucket>,
    {
        let set: BTreeSet<TimeBucket> = buckets.into_iter().collect();
        Self {
            buckets: set.into_iter().collect(),
        }
    }

    pub fn from_keyed(keyed: &[KeyedRecord<'_>]) -> Self {
        Self::from_buckets(keyed.iter().map(|k| k.bucket))
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[TimeBucket] {
        &self.buckets
    }

    /// Index of `bucket` on the timeline, if present.
    pub fn position(&self, bucket: &TimeBucket) -> Option<usize> {
        self.buckets.binary_search(bucket).ok()
    }

    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(TimeBucket::key).collect()
    }
}

/// Union of all record buckets, sorted ascending.
pub fn build_timeline(
    records: &[RawRecord],
    granularity: Granularity,
    diags: &mut Diagnostics,
) -> Timeline {
    Timeline::from_keyed(&key_records(records, granularity, diags))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: Option<i32>, month: Option<i64>, group: &str) -> RawRecord {
        RawRecord {
            year,
            month,
            group: Some(group.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn keys_are_zero_padded() {
        assert_eq!(TimeBucket::monthly(2023, 1).key(), "2023-01");
        assert_eq!(TimeBucket::monthly(2023, 12).key(), "2023-12");
        assert_eq!(TimeBucket::yearly(2023).key(), "2023");
    }

    #[test]
    fn yearly_bucket_sorts_before_its_months() {
        assert!(TimeBucket::yearly(2023) < TimeBucket::monthly(2023, 1));
        assert!(TimeBucket::monthly(2022, 12) < TimeBucket::yearly(2023));
        assert!(TimeBucket::monthly(2023, 2) < TimeBucket::monthly(2023, 10));
    }

    #[test]
    fn timeline_is_sorted_union() {
        let records = vec![
            rec(Some(2023), Some(3), "UOB"),
            rec(Some(2023), Some(1), "Awali"),
            rec(Some(2023), Some(3), "Awali"),
            rec(Some(2022), Some(12), "UOB"),
        ];
        let mut diags = Diagnostics::new();
        let timeline = build_timeline(&records, Granularity::Monthly, &mut diags);
        assert_eq!(timeline.labels(), vec!["2022-12", "2023-01", "2023-03"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn missing_year_is_reported_and_excluded() {
        let records = vec![rec(None, Some(1), "UOB"), rec(Some(2023), Some(2), "UOB")];
        let mut diags = Diagnostics::new();
        let keyed = key_records(&records, Granularity::Monthly, &mut diags);
        assert_eq!(keyed.len(), 1);
        assert_eq!(keyed[0].index, 1);
        assert_eq!(
            diags.into_vec(),
            vec![Diagnostic::MissingField {
                record: 0,
                field: "year".to_string()
            }]
        );
    }

    #[test]
    fn missing_month_falls_back_to_year() {
        let records = vec![rec(Some(2023), None, "UOB"), rec(Some(2023), Some(1), "UOB")];
        let mut diags = Diagnostics::new();
        let timeline = build_timeline(&records, Granularity::Monthly, &mut diags);
        assert_eq!(timeline.labels(), vec!["2023", "2023-01"]);
    }

    #[test]
    fn yearly_granularity_ignores_month() {
        let records = vec![rec(Some(2021), Some(5), "UOB"), rec(Some(2020), Some(1), "UOB")];
        let mut diags = Diagnostics::new();
        let timeline = build_timeline(&records, Granularity::Yearly, &mut diags);
        assert_eq!(timeline.labels(), vec!["2020", "2021"]);
    }

    #[test]
    fn out_of_range_month_is_excluded() {
        let records = vec![rec(Some(2023), Some(13), "UOB"), rec(Some(2023), Some(0), "UOB")];
        let mut diags = Diagnostics::new();
        let timeline = build_timeline(&records, Granularity::Monthly, &mut diags);
        assert!(timeline.is_empty());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn unrepresentable_year_is_not_blamed_on_the_month() {
        let records = vec![rec(Some(300_000), Some(6), "UOB")];
        let mut diags = Diagnostics::new();
        let timeline = build_timeline(&records, Granularity::Monthly, &mut diags);
        assert!(timeline.is_empty());
        assert_eq!(
            diags.into_vec(),
            vec![Diagnostic::InvalidYear {
                record: 0,
                year: 300_000
            }]
        );
    }

    #[test]
    fn position_lookup() {
        let timeline = Timeline::from_buckets(vec![
            TimeBucket::monthly(2023, 2),
            TimeBucket::monthly(2023, 1),
        ]);
        assert_eq!(timeline.position(&TimeBucket::monthly(2023, 2)), Some(1));
        assert_eq!(timeline.position(&TimeBucket::monthly(2023, 3)), None);
    }
}
