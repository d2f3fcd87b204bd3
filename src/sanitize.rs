use serde_json::Value;

/// Placeholder tokens the source tables use for "not reported".
const NOT_REPORTED: &[&str] = &["NR", "Nah"];

/// Coerces a JSON value to a finite number. Missing, null, NaN, infinities and
/// unparsable strings all become `0.0`.
pub fn sanitize_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite()).unwrap_or(0.0)
}

pub fn sanitize_positive(value: Option<&Value>) -> f64 {
    sanitize_number(value).max(0.0)
}

/// Same contract as [`sanitize_number`] for values that already left JSON.
pub fn sanitize_f64(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}

/// Trimmed display text; empty for missing, blank and not-reported values.
pub fn sanitize_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => sanitize_str(text),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

pub fn sanitize_str(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() || NOT_REPORTED.contains(&trimmed) {
        return String::new();
    }
    trimmed.to_string()
}

/// Formats a count for display without a trailing `.0` on whole numbers.
pub fn format_count(value: f64) -> String {
    let value = sanitize_f64(value);
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn number_strings_are_trimmed_before_parsing() {
        assert_eq!(sanitize_number(Some(&json!(" 12.5 "))), 12.5);
    }

    #[test]
    fn booleans_are_not_numbers() {
        assert_eq!(sanitize_number(Some(&json!(true))), 0.0);
    }

    #[test]
    fn format_count_drops_whole_fraction() {
        assert_eq!(format_count(30.0), "30");
        assert_eq!(format_count(2.5), "2.5");
        assert_eq!(format_count(f64::NAN), "0");
    }
}
