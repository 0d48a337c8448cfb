//! Caller-supplied filter specifications.
//!
//! A [`FilterSpec`] keeps filter names in the order they were given so the
//! engine can report per-step attrition in that order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The type a registered filter expects for its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterValueType {
    Bool,
    Int,
    Float,
    Text,
}

impl FilterValueType {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FilterValueType::Bool => "bool",
            FilterValueType::Int => "int",
            FilterValueType::Float => "float",
            FilterValueType::Text => "string",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FilterValue {
    #[must_use]
    pub fn value_type(&self) -> FilterValueType {
        match self {
            FilterValue::Bool(_) => FilterValueType::Bool,
            FilterValue::Int(_) => FilterValueType::Int,
            FilterValue::Float(_) => FilterValueType::Float,
            FilterValue::Text(_) => FilterValueType::Text,
        }
    }

    /// Whether this value satisfies `expected`. Integers are accepted where
    /// a float is registered; no other conversion is allowed.
    #[must_use]
    pub fn conforms_to(&self, expected: FilterValueType) -> bool {
        let actual = self.value_type();
        actual == expected || (actual == FilterValueType::Int && expected == FilterValueType::Float)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FilterValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FilterValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FilterValue::Int(n) => Some(*n as f64),
            FilterValue::Float(x) => Some(*x),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FilterValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Bool(b) => write!(f, "{b}"),
            FilterValue::Int(n) => write!(f, "{n}"),
            FilterValue::Float(x) => write!(f, "{x}"),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        FilterValue::Bool(b)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        FilterValue::Int(n)
    }
}

impl From<f64> for FilterValue {
    fn from(x: f64) -> Self {
        FilterValue::Float(x)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

/// Ordered mapping of filter name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces `name`. A replaced entry keeps its original position.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<FilterValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: &str, value: impl Into<FilterValue>) {
        let value = value.into();
        if let Some(slot) = self.entries.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.entries.push((name.to_string(), value));
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FilterSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SpecVisitor;

        impl<'de> Visitor<'de> for SpecVisitor {
            type Value = FilterSpec;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of filter names to bool, number or string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FilterSpec, A::Error> {
                let mut spec = FilterSpec::new();
                while let Some((name, value)) = access.next_entry::<String, FilterValue>()? {
                    spec.insert(&name, value);
                }
                Ok(spec)
            }
        }

        deserializer.deserialize_map(SpecVisitor)
    }
}
