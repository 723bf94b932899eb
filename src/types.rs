use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observation as it arrived from the reporting backend, after the
/// loader pulled out the fields named by the payload shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub year: Option<i32>,
    /// Raw month value; validated when the bucket key is derived.
    pub month: Option<i64>,
    pub group: Option<String>,
    /// Every numeric field the record carried. Absent means missing, not zero.
    pub metrics: BTreeMap<String, f64>,
}

impl RawRecord {
    pub fn metric(&self, field: &str) -> Option<f64> {
        self.metrics.get(field).copied()
    }
}

/// One named series of a chart; `None` renders as a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub name: String,
    pub data: Vec<Option<f64>>,
}

/// The only shape the rendering layer sees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartDataset {
    pub labels: Vec<String>,
    pub datasets: Vec<Series>,
}

impl ChartDataset {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels,
            datasets: Vec::new(),
        }
    }

    pub fn push(&mut self, name: impl Into<String>, data: Vec<Option<f64>>) {
        self.datasets.push(Series {
            name: name.into(),
            data,
        });
    }

    /// True when every series is exactly as long as the labels.
    pub fn is_aligned(&self) -> bool {
        self.datasets.iter().all(|s| s.data.len() == self.labels.len())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedChart {
    pub title: String,
    #[serde(flatten)]
    pub dataset: ChartDataset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    #[default]
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillPolicy {
    #[default]
    Zero,
    Null,
}

impl FillPolicy {
    pub fn value(self) -> Option<f64> {
        match self {
            FillPolicy::Zero => Some(0.0),
            FillPolicy::Null => None,
        }
    }
}

/// Fill policy plus the value transforms a caller may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignOptions {
    pub fill: FillPolicy,
    /// Round to the nearest integer.
    pub round: bool,
    /// Multiply by 100 (applied before rounding).
    pub percent: bool,
}

/// Payload field names that carry the time and group dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub year: String,
    pub month: String,
    pub group: Option<String>,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            year: "year".to_string(),
            month: "month".to_string(),
            group: None,
        }
    }
}

/// A metric field and the series name it is displayed under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub field: String,
    pub name: String,
}

impl MetricSeries {
    pub fn new(field: &str, name: &str) -> Self {
        Self {
            field: field.to_string(),
            name: name.to_string(),
        }
    }
}

/// Actual and predicted metrics drawn on one forecast chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPair {
    pub actual: MetricSeries,
    pub predicted: MetricSeries,
    /// Draw zero actual readings as gaps.
    #[serde(default)]
    pub hide_zero_actuals: bool,
}

/// How records of a payload turn into series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// One series per group, aligned to the shared timeline.
    Grouped { metric: String },
    /// Ungrouped payload, one series per metric.
    Metrics { metrics: Vec<MetricSeries> },
    /// Paired actual/predicted metrics with forecast masking.
    Forecast(ForecastPair),
    /// One chart per group, one series per metric, all on the shared timeline.
    PerGroup { metrics: Vec<MetricSeries> },
    /// Group names as labels, a single series. No timeline.
    Categorical { metric: MetricSeries },
    /// Linear fold of pre-aggregated, pre-sorted records. See
    /// [`crate::aggregate::fold_by_first_encounter`].
    Folded { metric: String },
}

/// Descriptor that drives the aggregator for one kind of backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadShape {
    pub name: String,
    pub title: String,
    /// Key of the record array; `None` when the payload itself is the array.
    #[serde(default)]
    pub records: Option<String>,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default)]
    pub fields: FieldNames,
    pub layout: Layout,
    #[serde(default)]
    pub align: AlignOptions,
}
