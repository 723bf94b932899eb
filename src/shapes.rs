// Payload shape descriptors for the reporting backend's endpoints.
//
// Each descriptor says where the records live in the response, which fields
// carry year/month/location, and which layout turns them into charts. Custom
// descriptors can be loaded from a JSON file and take precedence over the
// built-in ones with the same name.
use crate::error::ChartError;
use crate::types::{
    AlignOptions, FieldNames, FillPolicy, ForecastPair, Granularity, Layout, MetricSeries,
    PayloadShape,
};
use once_cell::sync::Lazy;
use std::path::Path;

const LOCATION: &str = "location_name";

fn by_location() -> FieldNames {
    FieldNames {
        group: Some(LOCATION.to_string()),
        ..Default::default()
    }
}

fn shape(
    name: &str,
    title: &str,
    records: &str,
    granularity: Granularity,
    fields: FieldNames,
    layout: Layout,
    align: AlignOptions,
) -> PayloadShape {
    PayloadShape {
        name: name.to_string(),
        title: title.to_string(),
        records: Some(records.to_string()),
        granularity,
        fields,
        layout,
        align,
    }
}

const NULL_FILL: AlignOptions = AlignOptions {
    fill: FillPolicy::Null,
    round: false,
    percent: false,
};

const PERCENT: AlignOptions = AlignOptions {
    fill: FillPolicy::Zero,
    round: false,
    percent: true,
};

const ROUNDED: AlignOptions = AlignOptions {
    fill: FillPolicy::Null,
    round: true,
    percent: false,
};

/// (metric field, shape suffix, title)
const PERFORMANCE_METRICS: [(&str, &str, &str); 3] = [
    ("performance_ratio", "performance-ratio", "Performance Ratio"),
    ("capacity_factor", "capacity-factor", "Capacity Factor"),
    ("output_per_pv", "output-per-pv", "Output per PV"),
];

fn performance_shapes() -> Vec<PayloadShape> {
    let mut out = vec![shape(
        "monthly-generation",
        "Theoretical vs Actual Generation",
        "monthly_generation",
        Granularity::Monthly,
        by_location(),
        Layout::PerGroup {
            metrics: vec![
                MetricSeries::new("actual_kwh", "Actual Generation"),
                MetricSeries::new("theoretical_kwh", "Theoretical Generation"),
            ],
        },
        NULL_FILL,
    )];
    for (field, slug, title) in PERFORMANCE_METRICS {
        // Output per PV is kWh, the other two are ratios shown as percent.
        let yearly_align = if field == "output_per_pv" {
            AlignOptions::default()
        } else {
            PERCENT
        };
        out.push(shape(
            &format!("monthly-{}", slug),
            &format!("Monthly {}", title),
            "monthly_performance",
            Granularity::Monthly,
            by_location(),
            Layout::Grouped {
                metric: field.to_string(),
            },
            AlignOptions::default(),
        ));
        out.push(shape(
            &format!("yearly-{}", slug),
            &format!("Yearly {}", title),
            "yearly_performance",
            Granularity::Yearly,
            by_location(),
            Layout::Folded {
                metric: field.to_string(),
            },
            yearly_align,
        ));
        out.push(shape(
            &format!("overall-{}", slug),
            title,
            "overall_performance",
            Granularity::Yearly,
            by_location(),
            Layout::Categorical {
                metric: MetricSeries::new(field, title),
            },
            AlignOptions::default(),
        ));
    }
    out
}

const POWER: (&str, &str) = ("totalPowerGeneration", "Power Generation (kWh)");

/// (shape suffix, title, companion metrics)
const WEATHER: [(&str, &str, &[(&str, &str)]); 7] = [
    (
        "sunshine",
        "Power Generation vs Average Sunshine Duration",
        &[("avgSunshineDuration", "Average Sunshine Duration (s)")],
    ),
    (
        "temperature",
        "Power Generation vs Temperature",
        &[
            ("minTemperature", "Minimum Temperature (°C)"),
            ("avgTemperature", "Average Temperature (°C)"),
            ("maxTemperature", "Maximum Temperature (°C)"),
        ],
    ),
    (
        "irradiance",
        "Power Generation vs Solar Irradiance",
        &[("avgSolarIrradiance", "Average Solar Irradiance (W/m²)")],
    ),
    (
        "humidity",
        "Power Generation vs Relative Humidity",
        &[("avgRelativeHumidity", "Average Relative Humidity (%)")],
    ),
    (
        "cloud-cover",
        "Power Generation vs Cloud Cover",
        &[("avgCloudCover", "Average Cloud Cover (%)")],
    ),
    (
        "wind-speed",
        "Power Generation vs Wind Speed",
        &[("avgWindSpeed", "Average Wind Speed (km/h)")],
    ),
    (
        "rainfall",
        "Power Generation vs Rainfall",
        &[("cumulativeRainfall", "Cumulative Rainfall (mm)")],
    ),
];

fn weather_shapes() -> Vec<PayloadShape> {
    WEATHER
        .iter()
        .map(|(slug, title, companions)| {
            let metrics = std::iter::once(&POWER)
                .chain(companions.iter())
                .map(|(field, name)| MetricSeries::new(field, name))
                .collect();
            shape(
                &format!("weather-{}", slug),
                title,
                "weatherData",
                Granularity::Monthly,
                FieldNames::default(),
                Layout::Metrics { metrics },
                ROUNDED,
            )
        })
        .collect()
}

/// Importance of each weather feature in the generation model, from the
/// same response as the weather charts.
fn feature_importance_shape() -> PayloadShape {
    shape(
        "weather-feature-importance",
        "Feature Importance Analysis",
        "featureImportance",
        Granularity::Monthly,
        FieldNames {
            group: Some("featureName".to_string()),
            ..Default::default()
        },
        Layout::Categorical {
            metric: MetricSeries::new("importanceValue", "Feature Importance"),
        },
        AlignOptions::default(),
    )
}

fn forecast_shapes() -> Vec<PayloadShape> {
    let fields = FieldNames {
        year: "Year".to_string(),
        month: "Month".to_string(),
        group: None,
    };
    [
        ("total", "Total"),
        ("uob", "UOB"),
        ("awali", "Awali"),
        ("refinery", "Refinery"),
    ]
    .iter()
    .map(|(slug, site)| {
        shape(
            &format!("power-{}", slug),
            &format!("{} Power Generation Forecast", site),
            "forecast",
            Granularity::Monthly,
            fields.clone(),
            Layout::Forecast(ForecastPair {
                actual: MetricSeries::new("Actual", "Actual Power Generation (kWh)"),
                predicted: MetricSeries::new("Predicted", "Predicted Power Generation (kWh)"),
                hide_zero_actuals: true,
            }),
            NULL_FILL,
        )
    })
    .collect()
}

pub static BUILTIN_SHAPES: Lazy<Vec<PayloadShape>> = Lazy::new(|| {
    let mut shapes = performance_shapes();
    shapes.extend(weather_shapes());
    shapes.push(feature_importance_shape());
    shapes.extend(forecast_shapes());
    shapes
});

pub fn builtin(name: &str) -> Option<&'static PayloadShape> {
    BUILTIN_SHAPES.iter().find(|s| s.name == name)
}

/// Read custom descriptors: a JSON array of shapes.
pub fn load_shapes(path: &Path) -> Result<Vec<PayloadShape>, ChartError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Look `name` up in `custom` first, then in the built-ins.
pub fn resolve(name: &str, custom: &[PayloadShape]) -> Result<PayloadShape, ChartError> {
    custom
        .iter()
        .find(|s| s.name == name)
        .or_else(|| builtin(name))
        .cloned()
        .ok_or_else(|| ChartError::UnknownShape(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn builtin_names_are_unique() {
        let names: HashSet<&str> = BUILTIN_SHAPES.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), BUILTIN_SHAPES.len());
        assert_eq!(BUILTIN_SHAPES.len(), 1 + 3 * 3 + 7 + 1 + 4);
    }

    #[test]
    fn forecast_shapes_read_capitalised_fields() {
        let s = builtin("power-awali").unwrap();
        assert_eq!(s.fields.year, "Year");
        assert!(matches!(s.layout, Layout::Forecast(_)));
    }

    #[test]
    fn yearly_ratios_are_percent() {
        assert!(builtin("yearly-capacity-factor").unwrap().align.percent);
        assert!(!builtin("yearly-output-per-pv").unwrap().align.percent);
    }

    #[test]
    fn custom_shapes_win() {
        let custom: Vec<PayloadShape> = serde_json::from_str(
            r#"[{
                "name": "power-uob",
                "title": "Custom",
                "records": "rows",
                "layout": {"kind": "grouped", "metric": "kwh"},
                "align": {"fill": "null"}
            }]"#,
        )
        .unwrap();
        let s = resolve("power-uob", &custom).unwrap();
        assert_eq!(s.title, "Custom");
        assert_eq!(s.align.fill, FillPolicy::Null);
        assert_eq!(s.fields.year, "year");
        assert_eq!(s.granularity, Granularity::Monthly);
    }

    #[test]
    fn unknown_shape() {
        assert!(matches!(
            resolve("nope", &[]),
            Err(ChartError::UnknownShape(_))
        ));
    }
}
