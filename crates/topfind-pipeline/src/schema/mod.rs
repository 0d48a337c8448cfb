//! Schema Normalizer: provider rows to the unified table of their kind.
//!
//! Each provider declares a [`SchemaMapping`] naming the source of every
//! unified column. [`validate_mappings`] checks those tables once at start
//! up; [`normalize`] then applies them row by row.

pub mod coerce;
pub mod columns;

use serde_json::Value as JsonValue;
use topfind_core::{Record, ResourceKind, ResourceTable, Value};
use topfind_scraper::{ProviderKind, ProviderRow};

pub use columns::{
    column_names, mapping_for, unified_columns, ColumnDef, ColumnSource, ColumnType, SchemaMapping,
    Source, WhenMissing,
};

use crate::error::SchemaError;

/// Per-search values some computed columns need.
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// ISO 639-1 code of the search.
    pub lang: String,
}

impl NormalizeContext {
    #[must_use]
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.trim().to_ascii_lowercase(),
        }
    }
}

/// Checks every provider mapping against its unified schema.
///
/// # Errors
///
/// Returns the first [`SchemaError`] found.
pub fn validate_mappings() -> Result<(), SchemaError> {
    ProviderKind::ALL
        .iter()
        .try_for_each(|&provider| check_mapping(mapping_for(provider)))
}

/// Every unified column must have exactly one source, and every source must
/// target a unified column.
///
/// # Errors
///
/// Returns [`SchemaError`] naming the first offending column.
pub fn check_mapping(mapping: &SchemaMapping) -> Result<(), SchemaError> {
    let provider = mapping.provider.to_string();
    let columns = unified_columns(mapping.provider.resource_kind());

    if let Some(unknown) = mapping
        .sources
        .iter()
        .find(|s| !columns.iter().any(|c| c.name == s.column))
    {
        return Err(SchemaError::UnknownColumn {
            provider,
            column: unknown.column,
        });
    }

    for def in columns {
        let count = mapping
            .sources
            .iter()
            .filter(|s| s.column == def.name)
            .count();
        match count {
            1 => {}
            0 => {
                return Err(SchemaError::Unmapped {
                    provider,
                    column: def.name,
                })
            }
            _ => {
                return Err(SchemaError::DuplicateSource {
                    provider,
                    column: def.name,
                    count,
                })
            }
        }
    }
    Ok(())
}

/// Converts one provider's rows into the unified table of its kind.
#[must_use]
pub fn normalize(
    provider: ProviderKind,
    rows: Vec<ProviderRow>,
    context: &NormalizeContext,
) -> ResourceTable {
    let kind = provider.resource_kind();
    let mapping = mapping_for(provider);
    let mut table = ResourceTable::new(kind, column_names(kind));

    for row in rows {
        let mut record = Record::new();
        for def in unified_columns(kind) {
            let source = mapping.source_for(def.name).unwrap_or(Source::Absent);
            let value = resolve(source, def, &row, context);
            record.set(def.name, apply_missing_policy(value, def));
        }
        table.push(record);
    }

    tracing::debug!(provider = %provider, rows = table.len(), "provider rows normalized");
    table
}

/// Concatenates per-provider tables of one kind. The result always carries
/// the full unified column set, even when `tables` is empty.
#[must_use]
pub fn concat(kind: ResourceKind, tables: Vec<ResourceTable>) -> ResourceTable {
    let mut combined = ResourceTable::new(kind, column_names(kind));
    for table in tables {
        combined.extend(table.into_rows());
    }
    combined
}

static NULL: JsonValue = JsonValue::Null;

fn field<'a>(row: &'a ProviderRow, name: &str) -> &'a JsonValue {
    row.get(name).unwrap_or(&NULL)
}

fn resolve(source: Source, def: &ColumnDef, row: &ProviderRow, context: &NormalizeContext) -> Value {
    match source {
        Source::Field(name) => coerce::coerce(field(row, name), def.ty),
        Source::Absent => Value::Missing,
        Source::Provider => Value::text(row.provider.as_str()),
        Source::Text(text) => Value::text(text),
        Source::Bool(b) => Value::Bool(b),
        Source::RequestedLanguage => Value::text(context.lang.clone()),
        Source::RequestedLanguageUpper => Value::List(vec![context.lang.to_ascii_uppercase()]),
        Source::Present(name) => {
            Value::Bool(!coerce::coerce(field(row, name), ColumnType::Text).is_missing())
        }
        Source::PriceIsZero(name) => {
            let price = field(row, name);
            Value::Bool(price.is_null() || coerce::to_float(price).is_some_and(|p| p.abs() < f64::EPSILON))
        }
        Source::AgeRating(name) => match coerce::coerce(field(row, name), ColumnType::Text) {
            Value::Text(label) => Value::Text(age_rating(&label)),
            other => other,
        },
        Source::Ratio {
            numerator,
            denominator,
        } => {
            let num = coerce::to_float(field(row, numerator));
            let den = coerce::to_float(field(row, denominator));
            match (num, den) {
                (Some(n), Some(d)) if d > 0.0 => Value::Float(n / d),
                _ => Value::Missing,
            }
        }
    }
}

fn apply_missing_policy(value: Value, def: &ColumnDef) -> Value {
    match (value, def.when_missing, def.ty) {
        (Value::Missing, WhenMissing::Zero, ColumnType::Int) => Value::Int(0),
        (Value::Missing, WhenMissing::Zero, ColumnType::Float) => Value::Float(0.0),
        (value, _, _) => value,
    }
}

/// Maps Play store content labels onto App Store style age ratings.
fn age_rating(label: &str) -> String {
    match label.trim() {
        "Everyone" => "4+".to_string(),
        "Everyone 10+" => "9+".to_string(),
        "Teen" => "12+".to_string(),
        "Mature 17+" => "17+".to_string(),
        "Adults only 18+" => "18+".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
