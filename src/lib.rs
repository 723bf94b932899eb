//! Reshapes irregular per-location, per-month or per-year energy records
//! from the reporting backend into chart-ready datasets: one shared,
//! sorted timeline of labels and equal-length named series.
//!
//! The pipeline is pure and synchronous. Fetching payloads and drawing the
//! result belong to the caller:
//!
//! ```text
//! payload (JSON) -> loader -> timekey -> group -> align -> forecast -> ChartDataset
//! ```

pub mod aggregate;
pub mod align;
pub mod diagnostics;
pub mod error;
pub mod forecast;
pub mod group;
pub mod loader;
pub mod output;
pub mod shapes;
pub mod timekey;
pub mod types;
pub mod util;

pub use aggregate::{aggregate, aggregate_payloads, Aggregation};
pub use error::ChartError;
pub use types::{ChartDataset, NamedChart, PayloadShape, RawRecord, Series};
