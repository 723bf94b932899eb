//! Alignment of one group's records onto the shared timeline.
//!
//! Series that only emit the buckets they have data for drift apart on the
//! x-axis as soon as two of them share a chart. Every series is therefore
//! built by looking each timeline bucket up in the group's records, so its
//! length is always the timeline length.

use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::timekey::{KeyedRecord, Timeline};
use crate::types::AlignOptions;
use crate::util::round_half_up;

/// Apply the requested value transforms: percent rescaling, then rounding.
pub fn transform(v: f64, opts: AlignOptions) -> f64 {
    let v = if opts.percent { v * 100.0 } else { v };
    if opts.round {
        round_half_up(v)
    } else {
        v
    }
}

/// Produce `timeline.len()` values for `metric` from `rows`.
///
/// - A bucket with no record gets the fill policy's value.
/// - A bucket whose record lacks `metric` is a gap (`None`), whatever the
///   fill policy says.
/// - When several rows share a bucket the first one in input order wins and
///   the rest are reported as ambiguous duplicates.
pub fn align_series(
    timeline: &Timeline,
    group: &str,
    rows: &[&KeyedRecord<'_>],
    metric: &str,
    opts: AlignOptions,
    diags: &mut Diagnostics,
) -> Vec<Option<f64>> {
    // Outer `None` = no record seen for the bucket yet.
    let mut slots: Vec<Option<Option<f64>>> = vec![None; timeline.len()];
    for row in rows {
        let Some(pos) = timeline.position(&row.bucket) else {
            tracing::debug!(bucket = %row.bucket, group, "bucket not on timeline, skipped");
            continue;
        };
        if slots[pos].is_some() {
            diags.push(Diagnostic::AmbiguousDuplicate {
                group: group.to_string(),
                bucket: row.bucket.key(),
                record: row.index,
            });
            continue;
        }
        slots[pos] = Some(row.record.metric(metric));
    }

    let fill = opts.fill.value();
    slots
        .into_iter()
        .map(|slot| slot.unwrap_or(fill).map(|v| transform(v, opts)))
        .collect()
}
