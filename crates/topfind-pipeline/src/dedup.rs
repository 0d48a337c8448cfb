//! Deduplication by natural key.

use std::collections::HashSet;

use topfind_core::{Record, ResourceTable};

/// Keeps the first row per value of `key_column` and drops later
/// duplicates. Rows whose key is missing or blank are never treated as
/// duplicates of each other. Row order is otherwise preserved.
#[must_use]
pub fn dedupe(mut table: ResourceTable, key_column: &str) -> ResourceTable {
    let mut seen = HashSet::new();
    table.retain(|row| match key_text(row, key_column) {
        Some(key) => seen.insert(key),
        None => true,
    });
    table
}

/// Deduplicates on the table kind's natural key, falling back to its
/// secondary key (news URL) for rows whose natural key is blank.
#[must_use]
pub fn dedupe_by_natural_key(mut table: ResourceTable) -> ResourceTable {
    let kind = table.kind();
    let primary = kind.natural_key();
    let fallback = kind.fallback_key();

    let before = table.len();
    let mut seen = HashSet::new();
    table.retain(|row| {
        let key = key_text(row, primary)
            .map(|k| (primary, k))
            .or_else(|| fallback.and_then(|f| key_text(row, f).map(|k| (f, k))));
        match key {
            Some(key) => seen.insert(key),
            None => true,
        }
    });

    let removed = before - table.len();
    if removed > 0 {
        tracing::info!(kind = %kind, removed, remaining = table.len(), "duplicates removed");
    }
    table
}

fn key_text(row: &Record, column: &str) -> Option<String> {
    let value = row.get(column);
    if value.is_missing() {
        return None;
    }
    let rendered = value.to_string();
    let trimmed = rendered.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use topfind_core::{ResourceKind, Value};

    use super::*;

    fn apps(ids: &[&str]) -> ResourceTable {
        let mut table = ResourceTable::new(
            ResourceKind::Apps,
            vec!["appId".to_string(), "title".to_string()],
        );
        for (i, id) in ids.iter().enumerate() {
            table.push(
                Record::new()
                    .with("appId", *id)
                    .with("title", format!("row {i}")),
            );
        }
        table
    }

    fn titles(table: &ResourceTable) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| r.text("title").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn keeps_first_occurrence() {
        let out = dedupe_by_natural_key(apps(&["a", "b", "a", "c", "b"]));
        assert_eq!(titles(&out), vec!["row 0", "row 1", "row 3"]);
    }

    #[test]
    fn dedupe_is_idempotent() {
        let once = dedupe_by_natural_key(apps(&["a", "b", "a", "c", "b"]));
        let twice = dedupe_by_natural_key(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn rows_without_key_are_kept() {
        let mut table = apps(&["a"]);
        table.push(Record::new().with("title", "no id 1"));
        table.push(Record::new().with("title", "no id 2"));
        let out = dedupe(table, "appId");
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn news_falls_back_to_url() {
        let mut table = ResourceTable::new(
            ResourceKind::News,
            vec!["title".to_string(), "URL".to_string()],
        );
        table.push(Record::new().with("title", "Same").with("URL", "https://a"));
        table.push(Record::new().with("title", "Same").with("URL", "https://b"));
        table.push(Record::new().with("title", Value::Missing).with("URL", "https://c"));
        table.push(Record::new().with("title", "   ").with("URL", "https://c"));
        let out = dedupe_by_natural_key(table);
        let urls: Vec<&str> = out.rows().iter().filter_map(|r| r.text("URL")).collect();
        assert_eq!(urls, vec!["https://a", "https://c"]);
    }
}
