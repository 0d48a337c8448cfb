//! Row-level evaluation of registered predicates.

use chrono::NaiveDate;
use topfind_core::{FilterValue, Record};

use super::language::{self, Detection};
use super::registry::Predicate;
use crate::text::{count_occurrences, fold};

/// Per-step inputs computed once before the rows are visited.
pub(crate) struct Prepared<'a> {
    pub value: &'a FilterValue,
    /// Content words of every expanded query, folded.
    pub query_words: &'a [Vec<String>],
    pub today: NaiveDate,
}

pub(crate) fn passes(predicate: Predicate, row: &Record, input: &Prepared<'_>) -> bool {
    let value = input.value;
    match predicate {
        Predicate::Keywords { fields, body } => {
            if value.as_bool() == Some(false) {
                return true;
            }
            keywords_match(row, fields, body, input.query_words)
        }
        Predicate::Score => {
            let threshold = value.as_f64().unwrap_or_default();
            let score = row.get("score").as_f64().unwrap_or_default();
            let ratings = row.get("ratings").as_f64().unwrap_or_default();
            let unrated = score.abs() < f64::EPSILON && ratings.abs() < f64::EPSILON;
            unrated || score >= threshold
        }
        Predicate::AtLeast(column) => match (row.get(column).as_f64(), value.as_f64()) {
            (Some(actual), Some(min)) => actual >= min,
            _ => false,
        },
        Predicate::AtMost(column) => match (row.get(column).as_f64(), value.as_f64()) {
            (Some(actual), Some(max)) => actual <= max,
            _ => false,
        },
        Predicate::RequireTrue(column) => {
            value.as_bool() != Some(true) || row.get(column).as_bool() == Some(true)
        }
        Predicate::Equals(column) => {
            row.get(column).as_bool().is_some() && row.get(column).as_bool() == value.as_bool()
        }
        Predicate::HasValue(column) => {
            let present = row
                .get(column)
                .searchable_text()
                .is_some_and(|text| !text.trim().is_empty());
            present == value.as_bool().unwrap_or(true)
        }
        Predicate::RecentUpdate(column) => {
            let (Some(date), Some(limit)) = (row.get(column).as_date(), value.as_i64()) else {
                return false;
            };
            years_between(date, input.today) < limit_years(limit)
        }
        Predicate::Language { declared, detect } => {
            let target = value.as_str().unwrap_or_default();
            language_match(row, declared, detect, target)
        }
    }
}

fn keywords_match(
    row: &Record,
    fields: &[&str],
    body: Option<&str>,
    query_words: &[Vec<String>],
) -> bool {
    if query_words.is_empty() {
        return true;
    }
    let haystack = fields
        .iter()
        .filter_map(|field| row.get(field).searchable_text())
        .map(|text| fold(&text))
        .collect::<Vec<_>>()
        .join("\n");
    let body = body
        .and_then(|column| row.get(column).searchable_text())
        .map(|text| fold(&text));

    query_words.iter().any(|words| {
        words.iter().all(|word| haystack.contains(word.as_str()))
            || body.as_deref().is_some_and(|body| {
                words.iter().all(|word| count_occurrences(body, word) >= 2)
            })
    })
}

fn language_match(row: &Record, declared: Option<&str>, detect: &[&str], target: &str) -> bool {
    if let Some(column) = declared {
        let cell = row.get(column);
        let codes: Vec<String> = match cell.as_list() {
            Some(items) => items.to_vec(),
            None => cell
                .as_str()
                .map(|s| s.split(',').map(|c| c.trim().to_string()).collect())
                .unwrap_or_default(),
        };
        if language::declares(&codes, target) {
            return true;
        }
    }

    let texts: Vec<String> = detect
        .iter()
        .filter_map(|field| row.get(field).searchable_text())
        .collect();
    language::detect(texts.iter().map(String::as_str), target) != Detection::Differs
}

#[allow(clippy::cast_precision_loss)]
fn years_between(date: NaiveDate, today: NaiveDate) -> f64 {
    (today - date).num_days().abs() as f64 / 365.0
}

#[allow(clippy::cast_precision_loss)]
fn limit_years(limit: i64) -> f64 {
    limit as f64
}
