//! The aggregator facade: payload shape in, chart datasets out.
//!
//! Every layout builds its labels from one shared [`Timeline`] (except the
//! categorical and folded ones, see their docs) and every series is aligned
//! to it, so all series of a chart have the length of its labels.

use crate::align::{align_series, transform};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ChartError;
use crate::forecast::{hide_zeros, mask_forecast};
use crate::group::{group_key, index_groups, UNGROUPED};
use crate::loader::extract_all;
use crate::timekey::{key_records, KeyedRecord, TimeBucket, Timeline};
use crate::types::{
    AlignOptions, ChartDataset, ForecastPair, Layout, MetricSeries, NamedChart, PayloadShape,
    RawRecord, Series,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Charts produced for one payload, plus everything that was skipped on
/// the way.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Aggregation {
    pub charts: Vec<NamedChart>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Align several metrics of the same rows. Duplicates are only reported
/// once; they are the same for every metric.
fn align_metrics(
    timeline: &Timeline,
    group: &str,
    rows: &[&KeyedRecord<'_>],
    metrics: &[MetricSeries],
    opts: AlignOptions,
    diags: &mut Diagnostics,
) -> Vec<Series> {
    let mut scratch = Diagnostics::new();
    metrics
        .iter()
        .enumerate()
        .map(|(i, m)| {
            let sink = if i == 0 { &mut *diags } else { &mut scratch };
            Series {
                name: m.name.clone(),
                data: align_series(timeline, group, rows, &m.field, opts, sink),
            }
        })
        .collect()
}

fn grouped(
    keyed: &[KeyedRecord<'_>],
    timeline: &Timeline,
    metric: &str,
    opts: AlignOptions,
    diags: &mut Diagnostics,
) -> ChartDataset {
    let mut dataset = ChartDataset::new(timeline.labels());
    for group in index_groups(keyed, |k| k.record.group.as_deref()) {
        let data = align_series(timeline, &group.name, &group.members, metric, opts, diags);
        dataset.push(group.name, data);
    }
    dataset
}

fn forecast(
    rows: &[&KeyedRecord<'_>],
    timeline: &Timeline,
    group: &str,
    pair: &ForecastPair,
    opts: AlignOptions,
    diags: &mut Diagnostics,
) -> Result<ChartDataset, ChartError> {
    // The pivot is found on untransformed actuals; rounding must not move it.
    let raw = AlignOptions {
        round: false,
        percent: false,
        ..opts
    };
    let actual_raw = align_series(timeline, group, rows, &pair.actual.field, raw, diags);
    let mut scratch = Diagnostics::new();
    let predicted_values =
        align_series(timeline, group, rows, &pair.predicted.field, opts, &mut scratch);
    let masked = mask_forecast(&actual_raw, &predicted_values)?;

    let mut actual_values: Vec<Option<f64>> = actual_raw
        .iter()
        .map(|v| v.map(|x| transform(x, opts)))
        .collect();
    if pair.hide_zero_actuals {
        actual_values = hide_zeros(&actual_values);
    }

    let mut dataset = ChartDataset::new(timeline.labels());
    dataset.push(pair.actual.name.clone(), actual_values);
    dataset.push(pair.predicted.name.clone(), masked);
    Ok(dataset)
}

/// One value per group, labelled by group name. Records carry no usable
/// time dimension here (overall figures), so no timeline is built.
pub fn categorical(
    records: &[RawRecord],
    metric: &MetricSeries,
    opts: AlignOptions,
    diags: &mut Diagnostics,
) -> ChartDataset {
    let indexed: Vec<(usize, &RawRecord)> = records.iter().enumerate().collect();
    let groups = index_groups(&indexed, |(_, r)| r.group.as_deref());
    let mut values = Vec::with_capacity(groups.len());
    let mut labels = Vec::with_capacity(groups.len());
    for group in groups {
        for (index, _) in group.members.iter().skip(1) {
            diags.push(Diagnostic::AmbiguousDuplicate {
                group: group.name.clone(),
                bucket: "overall".to_string(),
                record: *index,
            });
        }
        let value = group
            .members
            .first()
            .and_then(|(_, r)| r.metric(&metric.field))
            .map(|v| transform(v, opts));
        values.push(value);
        labels.push(group.name);
    }
    let mut dataset = ChartDataset::new(labels);
    dataset.push(metric.name.clone(), values);
    dataset
}

/// Linear fold of already aggregated records: each group's values are
/// appended in input order, labels are the distinct buckets in input order.
///
/// There is no lookup, so this only works when the upstream guarantees
/// exactly one record per group per bucket and buckets arrive sorted. Both
/// conditions are checked afterwards and a violation is an error rather
/// than a misaligned chart. Use [`aggregate`] with [`Layout::Grouped`] for
/// anything that does not meet them.
pub fn fold_by_first_encounter(
    keyed: &[KeyedRecord<'_>],
    metric: &str,
    opts: AlignOptions,
) -> Result<ChartDataset, ChartError> {
    let mut labels: Vec<TimeBucket> = Vec::new();
    let mut seen: HashSet<TimeBucket> = HashSet::new();
    let mut folded: Vec<(String, Vec<TimeBucket>, Vec<Option<f64>>)> = Vec::new();
    let mut slots: HashMap<Option<String>, usize> = HashMap::new();

    for k in keyed {
        if seen.insert(k.bucket) {
            labels.push(k.bucket);
        }
        let key = group_key(k.record.group.as_deref());
        let slot = *slots.entry(key.clone()).or_insert_with(|| {
            let name = key.unwrap_or_else(|| UNGROUPED.to_string());
            folded.push((name, Vec::new(), Vec::new()));
            folded.len() - 1
        });
        let entry = &mut folded[slot];
        entry.1.push(k.bucket);
        entry.2.push(k.record.metric(metric).map(|v| transform(v, opts)));
    }

    if let Some(w) = labels.windows(2).find(|w| w[0] >= w[1]) {
        return Err(ChartError::FoldPrecondition {
            reason: format!("bucket {} arrived after {}", w[1], w[0]),
        });
    }
    for (name, buckets, _) in &folded {
        if *buckets != labels {
            return Err(ChartError::FoldPrecondition {
                reason: format!(
                    "group '{}' has {} records for {} buckets or out of step",
                    name,
                    buckets.len(),
                    labels.len()
                ),
            });
        }
    }

    let mut dataset = ChartDataset::new(labels.iter().map(TimeBucket::key).collect());
    for (name, _, values) in folded {
        dataset.push(name, values);
    }
    Ok(dataset)
}

/// Shape `records` into charts as described by `shape`.
pub fn aggregate(records: &[RawRecord], shape: &PayloadShape) -> Result<Aggregation, ChartError> {
    let mut diags = Diagnostics::new();
    let opts = shape.align;
    let title = shape.title.clone();

    // Overall figures carry no time dimension and are never keyed.
    let keyed = match shape.layout {
        Layout::Categorical { .. } => Vec::new(),
        _ => key_records(records, shape.granularity, &mut diags),
    };
    let timeline = Timeline::from_keyed(&keyed);
    let rows: Vec<&KeyedRecord> = keyed.iter().collect();

    let mut charts = match &shape.layout {
        Layout::Categorical { metric } => vec![NamedChart {
            title,
            dataset: categorical(records, metric, opts, &mut diags),
        }],
        Layout::Grouped { metric } => vec![NamedChart {
            title,
            dataset: grouped(&keyed, &timeline, metric, opts, &mut diags),
        }],
        Layout::Metrics { metrics } => vec![NamedChart {
            title,
            dataset: ChartDataset {
                labels: timeline.labels(),
                datasets: align_metrics(&timeline, &shape.name, &rows, metrics, opts, &mut diags),
            },
        }],
        Layout::Forecast(pair) => vec![NamedChart {
            title,
            dataset: forecast(&rows, &timeline, &shape.name, pair, opts, &mut diags)?,
        }],
        Layout::PerGroup { metrics } => index_groups(&keyed, |k| k.record.group.as_deref())
            .into_iter()
            .map(|group| NamedChart {
                title: format!("{} - {}", title, group.name),
                dataset: ChartDataset {
                    labels: timeline.labels(),
                    datasets: align_metrics(
                        &timeline,
                        &group.name,
                        &group.members,
                        metrics,
                        opts,
                        &mut diags,
                    ),
                },
            })
            .collect(),
        Layout::Folded { metric } => vec![NamedChart {
            title,
            dataset: fold_by_first_encounter(&keyed, metric, opts)?,
        }],
    };

    for chart in &mut charts {
        // No labels means nothing to draw: every layout reports no series.
        if chart.dataset.labels.is_empty() {
            chart.dataset.datasets.clear();
        }
        debug_assert!(chart.dataset.is_aligned());
        tracing::debug!(
            shape = %shape.name,
            chart = %chart.title,
            labels = chart.dataset.labels.len(),
            series = chart.dataset.datasets.len(),
            "chart assembled"
        );
    }
    Ok(Aggregation {
        charts,
        diagnostics: diags.into_vec(),
    })
}

/// Extract and aggregate one or more materialized payloads.
pub fn aggregate_payloads(
    payloads: &[Value],
    shape: &PayloadShape,
) -> Result<Aggregation, ChartError> {
    let (records, report) = extract_all(payloads, shape)?;
    tracing::info!(
        shape = %shape.name,
        rows = report.total_rows,
        loaded = report.loaded_rows,
        skipped = report.skipped_rows,
        "payload extracted"
    );
    aggregate(&records, shape)
}
