use crate::error::ChartError;
use crate::types::{PayloadShape, RawRecord};
use crate::util::{parse_f64_lenient, parse_i64_lenient, parse_label};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    /// Array entries that were not JSON objects.
    pub skipped_rows: usize,
}

/// Read an already-fetched response body from disk.
pub fn load_payload(path: &Path) -> Result<Value, ChartError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Locate the record array a shape reads from.
///
/// A missing key or a JSON `null` counts as an empty array; the backend
/// serializes empty result sets that way.
fn record_array<'a>(payload: &'a Value, shape: &PayloadShape) -> Result<&'a [Value], ChartError> {
    let (key, node) = match shape.records.as_deref() {
        Some(key) => (key, payload.get(key)),
        None => ("<root>", Some(payload)),
    };
    match node {
        None | Some(Value::Null) => {
            tracing::warn!(shape = %shape.name, key, "no records in payload, treating as empty");
            Ok(&[])
        }
        Some(Value::Array(rows)) => Ok(rows.as_slice()),
        Some(_) => Err(ChartError::Payload {
            key: key.to_string(),
        }),
    }
}

fn to_record(obj: &Map<String, Value>, shape: &PayloadShape) -> RawRecord {
    let fields = &shape.fields;
    let year = obj
        .get(&fields.year)
        .and_then(parse_i64_lenient)
        .and_then(|y| i32::try_from(y).ok());
    let month = obj.get(&fields.month).and_then(parse_i64_lenient);
    let group = fields
        .group
        .as_ref()
        .and_then(|g| obj.get(g))
        .and_then(parse_label);

    let mut metrics = BTreeMap::new();
    for (key, value) in obj {
        if *key == fields.year || *key == fields.month || fields.group.as_ref() == Some(key) {
            continue;
        }
        if let Some(v) = parse_f64_lenient(value) {
            metrics.insert(key.clone(), v);
        }
    }

    RawRecord {
        year,
        month,
        group,
        metrics,
    }
}

/// Turn a materialized payload into records for `shape`.
pub fn extract_records(
    payload: &Value,
    shape: &PayloadShape,
) -> Result<(Vec<RawRecord>, LoadReport), ChartError> {
    let rows = record_array(payload, shape)?;
    let mut report = LoadReport {
        total_rows: rows.len(),
        ..Default::default()
    };
    let mut records = Vec::with_capacity(rows.len());
    for (i, row) in rows.iter().enumerate() {
        match row.as_object() {
            Some(obj) => records.push(to_record(obj, shape)),
            None => {
                tracing::warn!(row = i, "record is not an object, skipped");
                report.skipped_rows += 1;
            }
        }
    }
    report.loaded_rows = records.len();
    Ok((records, report))
}

/// Concatenate the records of several payloads, in payload order.
pub fn extract_all(
    payloads: &[Value],
    shape: &PayloadShape,
) -> Result<(Vec<RawRecord>, LoadReport), ChartError> {
    let mut records = Vec::new();
    let mut report = LoadReport::default();
    for payload in payloads {
        let (mut part, part_report) = extract_records(payload, shape)?;
        records.append(&mut part);
        report.total_rows += part_report.total_rows;
        report.loaded_rows += part_report.loaded_rows;
        report.skipped_rows += part_report.skipped_rows;
    }
    Ok((records, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldNames, Layout};
    use serde_json::json;

    fn shape(records: Option<&str>) -> PayloadShape {
        PayloadShape {
            name: "test".to_string(),
            title: "Test".to_string(),
            records: records.map(str::to_string),
            granularity: Default::default(),
            fields: FieldNames {
                group: Some("location_name".to_string()),
                ..Default::default()
            },
            layout: Layout::Grouped {
                metric: "performance_ratio".to_string(),
            },
            align: Default::default(),
        }
    }

    #[test]
    fn pulls_fields_out_of_objects() {
        let payload = json!({
            "monthly_performance": [
                {"year": 2023, "month": 1, "location_id": 2, "location_name": "UOB",
                 "performance_ratio": 0.81, "capacity_factor": "0.2", "note": "n/a"}
            ]
        });
        let (records, report) =
            extract_records(&payload, &shape(Some("monthly_performance"))).unwrap();
        assert_eq!(report.loaded_rows, 1);
        let r = &records[0];
        assert_eq!(r.year, Some(2023));
        assert_eq!(r.month, Some(1));
        assert_eq!(r.group.as_deref(), Some("UOB"));
        assert_eq!(r.metric("performance_ratio"), Some(0.81));
        assert_eq!(r.metric("capacity_factor"), Some(0.2));
        assert_eq!(r.metric("location_id"), Some(2.0));
        assert_eq!(r.metric("note"), None);
        assert_eq!(r.metric("year"), None);
    }

    #[test]
    fn null_or_missing_array_is_empty() {
        let s = shape(Some("monthly_performance"));
        let (records, _) = extract_records(&json!({"monthly_performance": null}), &s).unwrap();
        assert!(records.is_empty());

        let (records, _) = extract_records(&json!({}), &s).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn non_array_is_rejected() {
        let payload = json!({"monthly_performance": {"year": 2023}});
        let err = extract_records(&payload, &shape(Some("monthly_performance"))).unwrap_err();
        assert!(matches!(err, ChartError::Payload { .. }));
    }

    #[test]
    fn root_array_and_junk_rows() {
        let payload = json!([{"year": 2023}, 5, "x"]);
        let (records, report) = extract_records(&payload, &shape(None)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.skipped_rows, 2);
    }

    #[test]
    fn several_payloads_concatenate() {
        let a = json!([{"year": 2023, "month": 1}]);
        let b = json!([{"year": 2023, "month": 2}]);
        let (records, report) = extract_all(&[a, b], &shape(None)).unwrap();
        assert_eq!(report.loaded_rows, 2);
        assert_eq!(records[1].month, Some(2));
    }
}
