use crate::aggregate::Aggregation;
use crate::error::ChartError;
use crate::types::{ChartDataset, NamedChart};
use crate::util::format_value;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ChartError> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// One row per label, one column per series. Gaps are empty cells.
pub fn write_csv(path: &Path, dataset: &ChartDataset) -> Result<(), ChartError> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header = vec!["label".to_string()];
    header.extend(dataset.datasets.iter().map(|s| s.name.clone()));
    wtr.write_record(&header)?;
    for (i, label) in dataset.labels.iter().enumerate() {
        let mut row = vec![label.clone()];
        row.extend(dataset.datasets.iter().map(|s| match s.data.get(i).copied().flatten() {
            Some(v) => v.to_string(),
            None => String::new(),
        }));
        wtr.write_record(&row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write `<shape>.json` with every chart, one CSV per chart, and
/// `<shape>.diagnostics.json` when anything was skipped. Returns the paths
/// written.
pub fn export(
    dir: &Path,
    shape: &str,
    aggregation: &Aggregation,
) -> Result<Vec<PathBuf>, ChartError> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::new();

    let json_path = dir.join(format!("{}.json", shape));
    write_json(&json_path, &aggregation.charts)?;
    written.push(json_path);

    let single = aggregation.charts.len() == 1;
    for (i, chart) in aggregation.charts.iter().enumerate() {
        let csv_path = if single {
            dir.join(format!("{}.csv", shape))
        } else {
            dir.join(format!("{}-{}.csv", shape, i + 1))
        };
        write_csv(&csv_path, &chart.dataset)?;
        written.push(csv_path);
    }

    if !aggregation.diagnostics.is_empty() {
        let diag_path = dir.join(format!("{}.diagnostics.json", shape));
        write_json(&diag_path, &aggregation.diagnostics)?;
        written.push(diag_path);
    }
    Ok(written)
}

/// Markdown table of the first `max_rows` labels of a chart.
pub fn preview_table(chart: &NamedChart, max_rows: usize) -> String {
    let dataset = &chart.dataset;
    if dataset.labels.is_empty() {
        return "(no rows)".to_string();
    }
    let mut builder = Builder::default();
    let mut header = vec!["Label".to_string()];
    header.extend(dataset.datasets.iter().map(|s| s.name.clone()));
    builder.push_record(header);
    for (i, label) in dataset.labels.iter().take(max_rows).enumerate() {
        let mut row = vec![label.clone()];
        row.extend(
            dataset
                .datasets
                .iter()
                .map(|s| format_value(s.data.get(i).copied().flatten(), 2)),
        );
        builder.push_record(row);
    }
    builder.build().with(Style::markdown()).to_string()
}

pub fn print_preview(chart: &NamedChart, max_rows: usize) {
    println!("{}", chart.title);
    println!(
        "({} labels, {} series)\n",
        chart.dataset.labels.len(),
        chart.dataset.datasets.len()
    );
    println!("{}\n", preview_table(chart, max_rows));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart() -> NamedChart {
        let mut dataset = ChartDataset::new(vec!["2023-01".into(), "2023-02".into()]);
        dataset.push("UOB", vec![Some(1234.5), None]);
        NamedChart {
            title: "Monthly".to_string(),
            dataset,
        }
    }

    #[test]
    fn preview_has_header_and_rows() {
        let table = preview_table(&chart(), 1);
        assert!(table.contains("Label"));
        assert!(table.contains("UOB"));
        assert!(table.contains("1,234.50"));
        assert!(!table.contains("2023-02"));
    }

    #[test]
    fn empty_chart_preview() {
        let empty = NamedChart {
            title: "Empty".to_string(),
            dataset: ChartDataset::default(),
        };
        assert_eq!(preview_table(&empty, 5), "(no rows)");
    }

    #[test]
    fn export_writes_json_and_csv() {
        let dir = std::env::temp_dir().join(format!("solar_charts_export_{}", std::process::id()));
        let aggregation = Aggregation {
            charts: vec![chart()],
            diagnostics: Vec::new(),
        };
        let written = export(&dir, "monthly-test", &aggregation).unwrap();
        assert_eq!(written.len(), 2);

        let csv_text = std::fs::read_to_string(dir.join("monthly-test.csv")).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines, vec!["label,UOB", "2023-01,1234.5", "2023-02,"]);

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(dir.join("monthly-test.json")).unwrap())
                .unwrap();
        assert_eq!(json[0]["labels"][1], "2023-02");
        assert!(json[0]["datasets"][0]["data"][1].is_null());
        std::fs::remove_dir_all(&dir).ok();
    }
}
