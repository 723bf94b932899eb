use crate::error::ChartError;

/// Index of the first strictly positive actual value.
pub fn forecast_pivot(actual: &[Option<f64>]) -> Option<usize> {
    actual.iter().position(|v| matches!(v, Some(x) if *x > 0.0))
}

/// Suppress predicted values up to and including the first bucket with a
/// real observation, so the forecast line never overlaps the onset of
/// actual data. Without any positive actual the whole forecast is dropped.
pub fn mask_forecast(
    actual: &[Option<f64>],
    predicted: &[Option<f64>],
) -> Result<Vec<Option<f64>>, ChartError> {
    if actual.len() != predicted.len() {
        return Err(ChartError::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    let Some(pivot) = forecast_pivot(actual) else {
        tracing::debug!("no positive actual value, forecast suppressed");
        return Ok(vec![None; predicted.len()]);
    };
    Ok(predicted
        .iter()
        .enumerate()
        .map(|(i, v)| if i <= pivot { None } else { *v })
        .collect())
}

/// Zero readings are not drawn on the actual line.
pub fn hide_zeros(values: &[Option<f64>]) -> Vec<Option<f64>> {
    values.iter().map(|v| v.filter(|x| *x != 0.0)).collect()
}
