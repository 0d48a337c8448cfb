//! CSV export of resource tables.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use topfind_core::{export_fields, ResourceKind, ResourceTable, Value};

use crate::error::PipelineError;
use crate::filter::{audit_column, FilterStep};

/// Column selection for one exported table.
#[derive(Debug, Clone, Default)]
pub struct ExportLayout {
    /// Unified fields, in output order.
    pub fields: Vec<String>,
    /// Taxonomy `group.term` columns, rendered with `;` between synonyms.
    pub tags: Vec<String>,
    /// Per-filter pass columns, written last.
    pub audit: Vec<String>,
}

impl ExportLayout {
    /// `selected` empty means every exportable field of `kind`.
    #[must_use]
    pub fn new(kind: ResourceKind, selected: &[String], tags: Vec<String>) -> Self {
        Self {
            fields: export_fields(kind, selected),
            tags,
            audit: Vec::new(),
        }
    }

    /// Adds one audit column per filter the chain ran, in chain order.
    #[must_use]
    pub fn with_audit(mut self, steps: &[FilterStep]) -> Self {
        self.audit = steps.iter().map(|step| audit_column(&step.name)).collect();
        self
    }

    fn header(&self) -> Vec<&str> {
        self.fields
            .iter()
            .chain(&self.tags)
            .chain(&self.audit)
            .map(String::as_str)
            .collect()
    }
}

#[must_use]
pub fn export_path(out_dir: &Path, kind: ResourceKind) -> PathBuf {
    out_dir.join(format!("search_{kind}.csv"))
}

#[must_use]
pub fn audit_path(out_dir: &Path, kind: ResourceKind) -> PathBuf {
    out_dir.join(format!("search_{kind}_audit.csv"))
}

/// Writes `table` as CSV with a header row. Missing values render as `None`.
///
/// # Errors
///
/// Returns [`PipelineError::Csv`] if a record cannot be written.
pub fn write_csv<W: Write>(
    writer: W,
    table: &ResourceTable,
    layout: &ExportLayout,
) -> Result<(), PipelineError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(layout.header())?;
    for row in table.rows() {
        let record: Vec<String> = layout
            .fields
            .iter()
            .map(|column| row.get(column).to_string())
            .chain(layout.tags.iter().map(|key| render_tag(row.get(key))))
            .chain(layout.audit.iter().map(|column| row.get(column).to_string()))
            .collect();
        csv.write_record(&record)?;
    }
    csv.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn render_tag(value: &Value) -> String {
    match value {
        Value::List(items) => items.join(";"),
        Value::Missing => String::new(),
        other => other.to_string(),
    }
}

/// Writes `search_<kind>.csv` under `out_dir`, creating the directory.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the directory or file cannot be created,
/// or [`PipelineError::Csv`] if writing fails.
pub fn export_table(
    out_dir: &Path,
    table: &ResourceTable,
    layout: &ExportLayout,
) -> Result<PathBuf, PipelineError> {
    write_to(export_path(out_dir, table.kind()), out_dir, table, layout)
}

/// Writes the audit table as `search_<kind>_audit.csv`.
///
/// # Errors
///
/// Same as [`export_table`].
pub fn export_audit(
    out_dir: &Path,
    audit: &ResourceTable,
    layout: &ExportLayout,
) -> Result<PathBuf, PipelineError> {
    write_to(audit_path(out_dir, audit.kind()), out_dir, audit, layout)
}

fn write_to(
    path: PathBuf,
    out_dir: &Path,
    table: &ResourceTable,
    layout: &ExportLayout,
) -> Result<PathBuf, PipelineError> {
    fs::create_dir_all(out_dir).map_err(|source| PipelineError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let file = fs::File::create(&path).map_err(|source| PipelineError::Io {
        path: path.clone(),
        source,
    })?;
    write_csv(file, table, layout)?;
    tracing::info!(path = %path.display(), rows = table.len(), "csv written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use topfind_core::Record;

    use super::*;

    fn news_table() -> ResourceTable {
        let mut table = ResourceTable::new(
            ResourceKind::News,
            vec![
                "title".to_string(),
                "URL".to_string(),
                "authors".to_string(),
                "cancerTypes.breast".to_string(),
            ],
        );
        table.push(
            Record::new()
                .with("title", "Breast Cancer Awareness, 2024")
                .with("URL", "https://news.example/a")
                .with("authors", Value::List(vec!["Ana".to_string(), "Luis".to_string()]))
                .with(
                    "cancerTypes.breast",
                    Value::List(vec!["breast".to_string(), "mammary".to_string()]),
                ),
        );
        table.push(Record::new().with("title", "Other"));
        table
    }

    fn render(table: &ResourceTable, layout: &ExportLayout) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, table, layout).expect("write csv");
        String::from_utf8(buf).expect("utf-8")
    }

    #[test]
    fn writes_selected_fields_then_tags() {
        let layout = ExportLayout::new(
            ResourceKind::News,
            &["title".to_string(), "URL".to_string(), "authors".to_string()],
            vec!["cancerTypes.breast".to_string()],
        );
        let out = render(&news_table(), &layout);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "title,URL,authors,cancerTypes.breast");
        assert_eq!(
            lines[1],
            "\"Breast Cancer Awareness, 2024\",https://news.example/a,Ana; Luis,breast;mammary"
        );
        assert_eq!(lines[2], "Other,None,None,");
    }

    #[test]
    fn empty_selection_exports_all_allowed_fields() {
        let layout = ExportLayout::new(ResourceKind::News, &[], Vec::new());
        let out = render(&news_table(), &layout);
        let header = out.lines().next().expect("header");
        assert_eq!(
            header,
            "publishedAt,description,title,URL,language,mediaTitle,authors,summary,content,textLength,keywords"
        );
    }

    fn keyword_step() -> FilterStep {
        FilterStep {
            name: "keywords_search".to_string(),
            value: "true".to_string(),
            before: 2,
            after: 1,
        }
    }

    #[test]
    fn audit_columns_come_last() {
        let mut table = news_table();
        table.add_column("passed_keywords_search");
        table.rows_mut()[0].set("passed_keywords_search", true);
        table.rows_mut()[1].set("passed_keywords_search", false);

        let layout = ExportLayout::new(
            ResourceKind::News,
            &["title".to_string()],
            vec!["cancerTypes.breast".to_string()],
        )
        .with_audit(&[keyword_step()]);
        let out = render(&table, &layout);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "title,cancerTypes.breast,passed_keywords_search");
        assert_eq!(lines[2], "Other,,false");
    }

    #[test]
    fn tag_group_named_like_an_audit_column_stays_a_tag() {
        let mut table = news_table();
        table.add_column("passed_review.fda");
        table.rows_mut()[0].set("passed_review.fda", Value::List(vec!["fda".to_string()]));
        table.add_column("passed_keywords_search");
        table.rows_mut()[0].set("passed_keywords_search", true);
        table.rows_mut()[1].set("passed_keywords_search", false);

        let tags = vec!["passed_review.fda".to_string()];
        let main = ExportLayout::new(ResourceKind::News, &["title".to_string()], tags.clone());
        let out = render(&table, &main);
        assert_eq!(out.lines().next(), Some("title,passed_review.fda"));

        let audit = ExportLayout::new(ResourceKind::News, &["title".to_string()], tags)
            .with_audit(&[keyword_step()]);
        let out = render(&table, &audit);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "title,passed_review.fda,passed_keywords_search");
        assert_eq!(lines[1], "\"Breast Cancer Awareness, 2024\",fda,true");
    }

    #[test]
    fn export_table_creates_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let out_dir = dir.path().join("results");
        let layout = ExportLayout::new(ResourceKind::News, &["title".to_string()], Vec::new());

        let path = export_table(&out_dir, &news_table(), &layout).expect("export");
        assert_eq!(path, out_dir.join("search_news.csv"));
        let contents = fs::read_to_string(path).expect("read back");
        assert!(contents.starts_with("title\n"));
    }
}
