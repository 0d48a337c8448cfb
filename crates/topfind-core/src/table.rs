//! Row-oriented tables of normalized records.

use std::collections::BTreeMap;

use crate::resource::ResourceKind;
use crate::value::Value;

static MISSING: Value = Value::Missing;

/// One discovered item (app, video, podcast episode or article).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: BTreeMap<String, Value>,
}

impl Record {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    #[must_use]
    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<Value>) {
        self.values.insert(column.to_string(), value.into());
    }

    /// Returns the cell for `column`, or [`Value::Missing`] when absent.
    #[must_use]
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&MISSING)
    }

    #[must_use]
    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn remove(&mut self, column: &str) -> Option<Value> {
        self.values.remove(column)
    }

    /// Text view of a cell; `None` for missing and non-text values.
    #[must_use]
    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).as_str()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Moves the value at `from` to `to`, overwriting any existing value.
    pub fn rename(&mut self, from: &str, to: &str) {
        if let Some(value) = self.values.remove(from) {
            self.values.insert(to.to_string(), value);
        }
    }
}

/// Ordered records of one [`ResourceKind`] sharing a fixed column list.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTable {
    kind: ResourceKind,
    columns: Vec<String>,
    rows: Vec<Record>,
}

impl ResourceTable {
    #[must_use]
    pub fn new(kind: ResourceKind, columns: Vec<String>) -> Self {
        Self {
            kind,
            columns,
            rows: Vec::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Record] {
        &mut self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Appends `column` to the schema if not already present. Existing rows
    /// receive an explicit [`Value::Missing`].
    pub fn add_column(&mut self, column: &str) {
        if self.has_column(column) {
            return;
        }
        self.columns.push(column.to_string());
        for row in &mut self.rows {
            if !row.contains(column) {
                row.set(column, Value::Missing);
            }
        }
    }

    /// Appends a record, filling every schema column it lacks with
    /// [`Value::Missing`].
    pub fn push(&mut self, mut record: Record) {
        for column in &self.columns {
            if !record.contains(column) {
                record.set(column, Value::Missing);
            }
        }
        self.rows.push(record);
    }

    pub fn extend(&mut self, records: impl IntoIterator<Item = Record>) {
        for record in records {
            self.push(record);
        }
    }

    pub fn retain(&mut self, f: impl FnMut(&Record) -> bool) {
        self.rows.retain(f);
    }

    pub fn sort_by(&mut self, compare: impl FnMut(&Record, &Record) -> std::cmp::Ordering) {
        self.rows.sort_by(compare);
    }

    /// Returns an empty table with the same kind and columns.
    #[must_use]
    pub fn empty_like(&self) -> Self {
        Self::new(self.kind, self.columns.clone())
    }
}
