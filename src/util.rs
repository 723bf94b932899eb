// Parsing and formatting helpers.
//
// Backend payloads are not strict about number encoding, so everything that
// reads a JSON scalar goes through here and the rest of the crate can assume
// typed values.
use num_format::{Locale, ToFormattedString};
use serde_json::Value;

/// Read a JSON scalar as `f64`.
///
/// - JSON numbers pass through.
/// - Strings are trimmed, must not contain letters and may use `,` as a
///   thousands separator.
/// - Anything else (null, bool, arrays, objects) is `None`.
pub fn parse_f64_lenient(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_f64_str(s),
        _ => None,
    }
}

fn parse_f64_str(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty() || s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    s.replace(',', "").parse::<f64>().ok().filter(|f| f.is_finite())
}

/// Read a JSON scalar as a whole number. `2023.0` is accepted, `2023.5` is not.
pub fn parse_i64_lenient(v: &Value) -> Option<i64> {
    if let Some(i) = v.as_i64() {
        return Some(i);
    }
    let f = parse_f64_lenient(v)?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Group names may be strings or numeric ids; both become trimmed text.
pub fn parse_label(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Nearest integer, halves rounding toward positive infinity.
pub fn round_half_up(v: f64) -> f64 {
    (v + 0.5).floor()
}

/// Render a chart value for console previews: thousands separators, fixed
/// decimals, `-` for gaps.
pub fn format_value(v: Option<f64>, decimals: usize) -> String {
    let Some(n) = v else {
        return "-".to_string();
    };
    let s = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match s.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (s.as_str(), None),
    };
    // Beyond i64 (or not finite): no separators.
    let Ok(int_val) = int_part.parse::<i64>() else {
        return format!("{:.*}", decimals, n);
    };
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if n < 0.0 && res.chars().any(|c| c.is_ascii_digit() && c != '0') {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lenient_numbers() {
        assert_eq!(parse_f64_lenient(&json!(1.5)), Some(1.5));
        assert_eq!(parse_f64_lenient(&json!("1,234.5")), Some(1234.5));
        assert_eq!(parse_f64_lenient(&json!(" 12 ")), Some(12.0));
        assert_eq!(parse_f64_lenient(&json!("12 kWh")), None);
        assert_eq!(parse_f64_lenient(&json!(null)), None);
        assert_eq!(parse_f64_lenient(&json!(true)), None);
    }

    #[test]
    fn whole_numbers_only() {
        assert_eq!(parse_i64_lenient(&json!(2023)), Some(2023));
        assert_eq!(parse_i64_lenient(&json!(2023.0)), Some(2023));
        assert_eq!(parse_i64_lenient(&json!("7")), Some(7));
        assert_eq!(parse_i64_lenient(&json!(2023.5)), None);
    }

    #[test]
    fn labels_from_text_or_ids() {
        assert_eq!(parse_label(&json!(" UOB ")), Some("UOB".to_string()));
        assert_eq!(parse_label(&json!(3)), Some("3".to_string()));
        assert_eq!(parse_label(&json!("  ")), None);
        assert_eq!(parse_label(&json!(null)), None);
    }

    #[test]
    fn rounding_matches_half_up() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_half_up(2.49), 2.0);
    }

    #[test]
    fn preview_formatting() {
        assert_eq!(format_value(Some(1234567.891), 2), "1,234,567.89");
        assert_eq!(format_value(Some(-1500.0), 0), "-1,500");
        assert_eq!(format_value(Some(-0.001), 2), "0.00");
        assert_eq!(format_value(None, 2), "-");
        assert_eq!(format_int(9855usize), "9,855");
    }

    #[test]
    fn huge_values_format_without_separators() {
        assert_eq!(format_value(Some(1e20), 0), "100000000000000000000");
        assert_eq!(format_value(Some(-1e20), 1), "-100000000000000000000.0");
    }
}
