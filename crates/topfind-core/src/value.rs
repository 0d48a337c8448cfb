//! Cell values carried by normalized records.

use chrono::NaiveDate;

/// Canonical rendering of dates across every resource kind.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Rendering of [`Value::Missing`] in exported tables.
pub const MISSING_SENTINEL: &str = "None";

/// One cell of a [`crate::Record`].
///
/// `Missing` is the explicit "None" sentinel: a column that exists in the
/// unified schema but has no value for this row.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Missing,
    Bool(bool),
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Text(String),
    List(Vec<String>),
}

impl Value {
    #[must_use]
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Wraps a string, mapping empty input and the literal `"None"` to
    /// [`Value::Missing`].
    #[must_use]
    pub fn text_or_missing(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed == MISSING_SENTINEL {
            Value::Missing
        } else {
            Value::Text(trimmed.to_string())
        }
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Numeric view of the value; integers widen to `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Free text suitable for keyword matching. Lists are joined by spaces;
    /// non-textual values yield `None`.
    #[must_use]
    pub fn searchable_text(&self) -> Option<String> {
        match self {
            Value::Text(s) => Some(s.clone()),
            Value::List(items) if !items.is_empty() => Some(items.join(" ")),
            _ => None,
        }
    }

    /// Converts a provider JSON value into a cell, keeping its native type.
    #[must_use]
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Missing,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .or_else(|| n.as_f64().map(Value::Float))
                .unwrap_or(Value::Missing),
            serde_json::Value::String(s) => Value::Text(s.clone()),
            serde_json::Value::Array(items) => Value::List(
                items
                    .iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            serde_json::Value::Object(_) => Value::Text(json.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Missing => f.write_str(MISSING_SENTINEL),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Value::Text(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join("; ")),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_renders_as_none_sentinel() {
        assert_eq!(Value::Missing.to_string(), "None");
    }

    #[test]
    fn text_or_missing_maps_sentinels() {
        assert_eq!(Value::text_or_missing(""), Value::Missing);
        assert_eq!(Value::text_or_missing("None"), Value::Missing);
        assert_eq!(Value::text_or_missing(" abc "), Value::text("abc"));
    }

    #[test]
    fn dates_render_in_canonical_format() {
        let d = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(Value::Date(d).to_string(), "2024-03-07");
    }

    #[test]
    fn from_json_keeps_integer_and_float_apart() {
        assert_eq!(Value::from_json(&serde_json::json!(12)), Value::Int(12));
        assert_eq!(Value::from_json(&serde_json::json!(4.5)), Value::Float(4.5));
        assert_eq!(Value::from_json(&serde_json::Value::Null), Value::Missing);
    }

    #[test]
    fn from_json_stringifies_list_items() {
        let v = Value::from_json(&serde_json::json!(["Health", 3]));
        assert_eq!(v, Value::List(vec!["Health".to_string(), "3".to_string()]));
    }

    #[test]
    fn int_widens_to_f64() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::text("3").as_f64(), None);
    }
}
