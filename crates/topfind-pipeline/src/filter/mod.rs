//! Filter engine.
//!
//! A caller's [`FilterSpec`] is checked against the kind's registry in full
//! before any row is touched. The resulting [`FilterChain`] then narrows a
//! table step by step in the caller's order, recording how many rows each
//! step let through.

mod language;
mod predicates;
pub mod registry;

use chrono::NaiveDate;
use topfind_core::{FilterSpec, FilterValue, ResourceKind, ResourceTable, ValidationError, Value};

use self::predicates::Prepared;
pub use self::registry::{default_spec, FilterDef, Predicate};
use crate::text::{content_words, StopWords};

const AUDIT_PREFIX: &str = "passed_";

/// Audit column holding the cumulative pass state after `filter`.
#[must_use]
pub fn audit_column(filter: &str) -> String {
    format!("{AUDIT_PREFIX}{filter}")
}

/// Validates filter specifications for one resource kind.
#[derive(Debug, Clone, Copy)]
pub struct FilterEngine {
    kind: ResourceKind,
}

impl FilterEngine {
    #[must_use]
    pub fn for_kind(kind: ResourceKind) -> Self {
        Self { kind }
    }

    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn registered(&self) -> &'static [FilterDef] {
        registry::registered(self.kind)
    }

    /// Checks every entry of `spec` and resolves it to a runnable chain.
    ///
    /// # Errors
    ///
    /// - [`ValidationError::UnknownFilter`] for a name this kind does not register
    /// - [`ValidationError::FilterTypeMismatch`] for a value of the wrong type
    /// - [`ValidationError::FilterOutOfRange`] for a well-typed but unusable value
    pub fn validate(&self, spec: &FilterSpec) -> Result<FilterChain, ValidationError> {
        let mut steps = Vec::with_capacity(spec.len());
        for (name, value) in spec.iter() {
            let def = registry::lookup(self.kind, name).ok_or_else(|| {
                ValidationError::UnknownFilter {
                    kind: self.kind,
                    name: name.to_string(),
                }
            })?;
            if !value.conforms_to(def.value_type) {
                return Err(ValidationError::FilterTypeMismatch {
                    kind: self.kind,
                    name: name.to_string(),
                    expected: def.value_type.name(),
                    found: value.value_type().name(),
                });
            }
            check_range(def, value)?;
            steps.push(ChainStep {
                def: *def,
                value: value.clone(),
            });
        }
        Ok(FilterChain {
            kind: self.kind,
            steps,
        })
    }
}

fn check_range(def: &FilterDef, value: &FilterValue) -> Result<(), ValidationError> {
    let out_of_range = |reason: &str| ValidationError::FilterOutOfRange {
        name: def.name.to_string(),
        reason: reason.to_string(),
    };
    match def.predicate {
        Predicate::Score => {
            let score = value.as_f64().unwrap_or_default();
            if !(0.0..=5.0).contains(&score) {
                return Err(out_of_range("score must be between 0 and 5"));
            }
        }
        Predicate::AtLeast(_) | Predicate::AtMost(_) | Predicate::RecentUpdate(_) => {
            if value.as_i64().is_some_and(|n| n < 0) {
                return Err(out_of_range("must not be negative"));
            }
        }
        Predicate::Language { .. } => {
            if value.as_str().is_none_or(|code| code.trim().is_empty()) {
                return Err(out_of_range("language code must not be empty"));
            }
        }
        Predicate::Keywords { .. }
        | Predicate::RequireTrue(_)
        | Predicate::Equals(_)
        | Predicate::HasValue(_) => {}
    }
    Ok(())
}

/// A validated filter and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainStep {
    pub def: FilterDef,
    pub value: FilterValue,
}

/// Filters validated for one kind, in application order.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterChain {
    kind: ResourceKind,
    steps: Vec<ChainStep>,
}

/// Inputs shared by every step of a run.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Expanded queries; the keyword rule matches against these.
    pub queries: Vec<String>,
    pub today: NaiveDate,
}

/// Rows before and after one filter step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterStep {
    pub name: String,
    pub value: String,
    pub before: usize,
    pub after: usize,
}

#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: ResourceTable,
    pub steps: Vec<FilterStep>,
    /// Every input row with one cumulative pass/fail column per step, named
    /// `passed_<filter>`. Only built when requested.
    pub audit: Option<ResourceTable>,
}

impl FilterChain {
    #[must_use]
    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    #[must_use]
    pub fn steps(&self) -> &[ChainStep] {
        &self.steps
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.def.name).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Runs every step in order. Each step only sees rows that survived the
    /// previous ones; surviving rows keep their relative order.
    #[must_use]
    pub fn apply(&self, table: ResourceTable, context: &FilterContext, audit: bool) -> FilterOutcome {
        let stop_words = StopWords::all_languages();
        let query_words: Vec<Vec<String>> = context
            .queries
            .iter()
            .map(|query| content_words(query, stop_words))
            .collect();

        let mut alive = vec![true; table.len()];
        let mut steps = Vec::with_capacity(self.steps.len());
        let mut audit_columns: Vec<(String, Vec<bool>)> = Vec::new();

        for step in &self.steps {
            let before = alive.iter().filter(|a| **a).count();
            let prepared = Prepared {
                value: &step.value,
                query_words: &query_words,
                today: context.today,
            };
            for (row, keep) in table.rows().iter().zip(alive.iter_mut()) {
                if *keep && !predicates::passes(step.def.predicate, row, &prepared) {
                    *keep = false;
                }
            }
            let after = alive.iter().filter(|a| **a).count();
            tracing::info!(
                kind = %self.kind,
                filter = step.def.name,
                value = %step.value,
                before,
                after,
                "filter applied"
            );
            steps.push(FilterStep {
                name: step.def.name.to_string(),
                value: step.value.to_string(),
                before,
                after,
            });
            if audit {
                audit_columns.push((audit_column(step.def.name), alive.clone()));
            }
        }

        let audit = audit.then(|| audit_table(&table, &audit_columns));

        let mut filtered = table.empty_like();
        filtered.extend(
            table
                .into_rows()
                .into_iter()
                .zip(alive)
                .filter_map(|(row, keep)| keep.then_some(row)),
        );

        FilterOutcome {
            table: filtered,
            steps,
            audit,
        }
    }
}

fn audit_table(table: &ResourceTable, columns: &[(String, Vec<bool>)]) -> ResourceTable {
    let mut audit = table.clone();
    for (name, _) in columns {
        audit.add_column(name);
    }
    for (index, row) in audit.rows_mut().iter_mut().enumerate() {
        for (name, passed) in columns {
            row.set(name, Value::Bool(passed[index]));
        }
    }
    audit
}

#[cfg(test)]
#[path = "filter_test.rs"]
mod tests;
