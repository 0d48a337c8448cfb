//! Provider JSON to typed cell coercions.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value as JsonValue;
use topfind_core::Value;

use super::columns::ColumnType;

/// Calendar formats seen across providers, tried in order after the
/// RFC 3339 / RFC 2822 timestamp parsers.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%d %b %Y", "%Y/%m/%d"];

/// Unix timestamps above this are taken to be in milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Converts a provider-native value to a cell of type `ty`.
///
/// Values that cannot be read as the column type become
/// [`Value::Missing`], except dates, which keep their raw text so date
/// filters can exclude them.
#[must_use]
pub fn coerce(json: &JsonValue, ty: ColumnType) -> Value {
    if json.is_null() {
        return Value::Missing;
    }
    match ty {
        ColumnType::Text => to_text(json),
        ColumnType::Int => to_int(json).map_or(Value::Missing, Value::Int),
        ColumnType::Float => to_float(json).map_or(Value::Missing, Value::Float),
        ColumnType::Bool => to_bool(json).map_or(Value::Missing, Value::Bool),
        ColumnType::Date => to_date(json),
        ColumnType::List => to_list(json),
    }
}

fn to_text(json: &JsonValue) -> Value {
    match json {
        JsonValue::String(s) => Value::text_or_missing(s),
        JsonValue::Number(n) => Value::Text(n.to_string()),
        JsonValue::Bool(b) => Value::Text(b.to_string()),
        JsonValue::Array(items) => {
            let joined = items
                .iter()
                .filter_map(|item| match item {
                    JsonValue::String(s) => Some(s.clone()),
                    JsonValue::Null => None,
                    other => Some(other.to_string()),
                })
                .collect::<Vec<_>>()
                .join(", ");
            Value::text_or_missing(&joined)
        }
        JsonValue::Object(_) => Value::Text(json.to_string()),
        JsonValue::Null => Value::Missing,
    }
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn to_int(json: &JsonValue) -> Option<i64> {
    match json {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|x| x.round() as i64)),
        JsonValue::String(s) => {
            let cleaned: String = s.chars().filter(|c| !matches!(c, ',' | '+' | ' ')).collect();
            cleaned
                .parse::<i64>()
                .ok()
                .or_else(|| cleaned.parse::<f64>().ok().map(|x| x.round() as i64))
        }
        _ => None,
    }
}

pub(crate) fn to_float(json: &JsonValue) -> Option<f64> {
    match json {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => {
            let amount = s.trim().trim_start_matches(['$', '€', '£']).trim();
            // With both marks present the comma groups thousands; alone it
            // is a decimal comma.
            let normalized = if amount.contains('.') {
                amount.replace(',', "")
            } else {
                amount.replace(',', ".")
            };
            normalized.parse::<f64>().ok()
        }
        _ => None,
    }
}

fn to_bool(json: &JsonValue) -> Option<bool> {
    match json {
        JsonValue::Bool(b) => Some(*b),
        JsonValue::Number(n) => n.as_f64().map(|x| x.abs() > f64::EPSILON),
        JsonValue::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "1.0" | "yes" => Some(true),
            "false" | "0" | "0.0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn to_list(json: &JsonValue) -> Value {
    let items: Vec<String> = match json {
        JsonValue::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                JsonValue::String(s) => Some(s.trim().to_string()),
                JsonValue::Null => None,
                other => Some(other.to_string()),
            })
            .filter(|s| !s.is_empty())
            .collect(),
        JsonValue::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != topfind_core::MISSING_SENTINEL)
            .map(str::to_string)
            .collect(),
        JsonValue::Number(_) | JsonValue::Bool(_) => vec![json.to_string()],
        JsonValue::Object(_) | JsonValue::Null => Vec::new(),
    };
    if items.is_empty() {
        Value::Missing
    } else {
        Value::List(items)
    }
}

fn to_date(json: &JsonValue) -> Value {
    match json {
        JsonValue::Number(n) => n
            .as_i64()
            .and_then(from_unix)
            .map_or(Value::Missing, Value::Date),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() || trimmed == topfind_core::MISSING_SENTINEL {
                return Value::Missing;
            }
            parse_date(trimmed).map_or_else(|| Value::Text(trimmed.to_string()), Value::Date)
        }
        _ => Value::Missing,
    }
}

fn from_unix(raw: i64) -> Option<NaiveDate> {
    let secs = if raw.abs() >= MILLIS_THRESHOLD {
        raw / 1000
    } else {
        raw
    };
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Parses the date formats providers use into a calendar date.
///
/// Partial dates (`2024-03`, `2024`) resolve to the first day of the
/// period.
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Some(date) = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
    {
        return Some(date);
    }
    if raw.chars().all(|c| c.is_ascii_digit()) {
        return match raw.len() {
            4 => NaiveDate::parse_from_str(&format!("{raw}-01-01"), "%Y-%m-%d").ok(),
            9.. => raw.parse::<i64>().ok().and_then(from_unix),
            _ => None,
        };
    }
    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn dates_from_every_provider_format() {
        assert_eq!(parse_date("2024-01-02T10:00:00Z"), Some(ymd(2024, 1, 2)));
        assert_eq!(parse_date("Tue, 02 Apr 2024 08:00:00 GMT"), Some(ymd(2024, 4, 2)));
        assert_eq!(parse_date("Apr 3, 2024"), Some(ymd(2024, 4, 3)));
        assert_eq!(parse_date("2023-11-30"), Some(ymd(2023, 11, 30)));
        assert_eq!(parse_date("2021-06"), Some(ymd(2021, 6, 1)));
        assert_eq!(parse_date("2020"), Some(ymd(2020, 1, 1)));
        assert_eq!(parse_date("1700000000"), Some(ymd(2023, 11, 14)));
    }

    #[test]
    fn unix_seconds_and_millis() {
        assert_eq!(coerce(&json!(1_700_000_000), ColumnType::Date), Value::Date(ymd(2023, 11, 14)));
        assert_eq!(
            coerce(&json!(1_700_000_000_000_i64), ColumnType::Date),
            Value::Date(ymd(2023, 11, 14))
        );
    }

    #[test]
    fn unparsable_date_keeps_raw_text() {
        assert_eq!(
            coerce(&json!("sometime soon"), ColumnType::Date),
            Value::Text("sometime soon".to_string())
        );
    }

    #[test]
    fn booleans_from_provider_encodings() {
        assert_eq!(coerce(&json!("True"), ColumnType::Bool), Value::Bool(true));
        assert_eq!(coerce(&json!("0.0"), ColumnType::Bool), Value::Bool(false));
        assert_eq!(coerce(&json!(0), ColumnType::Bool), Value::Bool(false));
        assert_eq!(coerce(&json!("maybe"), ColumnType::Bool), Value::Missing);
    }

    #[test]
    fn numbers_from_strings() {
        assert_eq!(coerce(&json!("1,234"), ColumnType::Int), Value::Int(1234));
        assert_eq!(coerce(&json!(4.6), ColumnType::Int), Value::Int(5));
        assert_eq!(coerce(&json!("$2.99"), ColumnType::Float), Value::Float(2.99));
        assert_eq!(coerce(&json!("n/a"), ColumnType::Float), Value::Missing);
    }

    #[test]
    fn prices_with_thousands_or_decimal_comma() {
        assert_eq!(to_float(&json!("$1,299.99")), Some(1299.99));
        assert_eq!(to_float(&json!("€ 2,49")), Some(2.49));
        assert_eq!(to_float(&json!("1,234,567.5")), Some(1_234_567.5));
    }

    #[test]
    fn lists_from_arrays_and_comma_strings() {
        assert_eq!(
            coerce(&json!(["EN", "ES"]), ColumnType::List),
            Value::List(vec!["EN".to_string(), "ES".to_string()])
        );
        assert_eq!(
            coerce(&json!("health, care"), ColumnType::List),
            Value::List(vec!["health".to_string(), "care".to_string()])
        );
        assert_eq!(coerce(&json!([]), ColumnType::List), Value::Missing);
    }

    #[test]
    fn text_sentinel_is_missing() {
        assert_eq!(coerce(&json!("None"), ColumnType::Text), Value::Missing);
        assert_eq!(coerce(&json!(42), ColumnType::Text), Value::text("42"));
    }
}
