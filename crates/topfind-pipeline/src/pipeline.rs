//! Search orchestration.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use topfind_core::{validate_export_fields, FilterSpec, ResourceKind, ResourceTable, Taxonomy};
use topfind_scraper::{collect, CollectOptions, ProviderAdapter, ProviderReport};

use crate::dedup::dedupe_by_natural_key;
use crate::error::PipelineError;
use crate::export::{export_audit, export_table, ExportLayout};
use crate::filter::{default_spec, FilterChain, FilterContext, FilterEngine, FilterStep};
use crate::matcher::TaxonomyMatcher;
use crate::query::expand;
use crate::schema::{concat, normalize, validate_mappings, NormalizeContext};

/// Everything a caller supplies for one resource kind.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub kind: ResourceKind,
    pub queries: Vec<String>,
    /// Synonyms per query term, aligned by index with `queries`.
    pub synonyms: Vec<Vec<String>>,
    /// `None` runs the kind's default chain.
    pub filters: Option<FilterSpec>,
    /// Export fields; empty means all.
    pub fields: Vec<String>,
    pub taxonomy: Taxonomy,
    pub lang: String,
    pub country: String,
    pub audit: bool,
}

impl SearchRequest {
    #[must_use]
    pub fn new(kind: ResourceKind, queries: Vec<String>) -> Self {
        Self {
            kind,
            queries,
            synonyms: Vec::new(),
            filters: None,
            fields: Vec::new(),
            taxonomy: Taxonomy::default(),
            lang: "en".to_string(),
            country: "us".to_string(),
            audit: false,
        }
    }

    /// The filters that will run: the caller's, or the default chain.
    #[must_use]
    pub fn effective_filters(&self) -> FilterSpec {
        self.filters
            .clone()
            .unwrap_or_else(|| default_spec(self.kind, &self.lang))
    }

    /// Checks filters, export fields and schema mappings.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Validation`] for a bad filter or export field
    /// and [`PipelineError::Schema`] for an incomplete provider mapping.
    pub fn validate(&self) -> Result<FilterChain, PipelineError> {
        let chain = FilterEngine::for_kind(self.kind).validate(&self.effective_filters())?;
        validate_export_fields(self.kind, &self.fields)?;
        validate_mappings()?;
        Ok(chain)
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub collect: CollectOptions,
    /// Reference date for `recent_update`.
    pub today: NaiveDate,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            collect: CollectOptions::default(),
            today: chrono::Utc::now().date_naive(),
        }
    }
}

/// Row count after one pipeline stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageCount {
    pub stage: &'static str,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct SearchReport {
    pub kind: ResourceKind,
    /// Expanded queries that were searched.
    pub queries: Vec<String>,
    pub table: ResourceTable,
    pub audit: Option<ResourceTable>,
    /// Taxonomy columns added by tagging.
    pub tag_columns: Vec<String>,
    pub stages: Vec<StageCount>,
    pub filter_steps: Vec<FilterStep>,
    pub providers: Vec<ProviderReport>,
}

impl SearchReport {
    /// Writes `search_<kind>.csv`, plus the audit CSV when one was built.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] if a file cannot be written.
    pub fn export(&self, out_dir: &Path, fields: &[String]) -> Result<Vec<PathBuf>, PipelineError> {
        let layout = ExportLayout::new(self.kind, fields, self.tag_columns.clone());
        let mut written = vec![export_table(out_dir, &self.table, &layout)?];
        if let Some(audit) = &self.audit {
            let layout = layout.with_audit(&self.filter_steps);
            written.push(export_audit(out_dir, audit, &layout)?);
        }
        Ok(written)
    }
}

/// Run one search end to end.
///
/// 1. Validate filters, export fields and mappings. Nothing is fetched if
///    this fails.
/// 2. Expand queries with their synonyms.
/// 3. Collect from every adapter of the request's kind concurrently.
/// 4. Normalize each provider's rows and concatenate.
/// 5. Tag rows with the taxonomy.
/// 6. Deduplicate on the natural key.
/// 7. Apply the filter chain; apps are then ordered by `ratings`, highest first.
///
/// Provider failures never fail the run; they show up in
/// [`SearchReport::providers`].
///
/// # Errors
///
/// Returns [`PipelineError`] only for validation failures.
pub async fn run_search(
    request: &SearchRequest,
    adapters: &[Arc<dyn ProviderAdapter>],
    options: &SearchOptions,
) -> Result<SearchReport, PipelineError> {
    let kind = request.kind;

    // Step 1: Validate before any network call.
    let chain = request.validate()?;

    // Step 2: Expand queries.
    let queries = expand(&request.queries, &request.synonyms);
    tracing::info!(kind = %kind, queries = queries.len(), "queries expanded");

    // Step 3: Collect from every provider of this kind.
    let relevant: Vec<&Arc<dyn ProviderAdapter>> = adapters
        .iter()
        .filter(|adapter| {
            let matches = adapter.kind().resource_kind() == kind;
            if !matches {
                tracing::warn!(
                    kind = %kind,
                    provider = %adapter.kind(),
                    "adapter serves another resource kind, skipping"
                );
            }
            matches
        })
        .collect();
    let outcomes = join_all(
        relevant
            .iter()
            .map(|adapter| collect(&***adapter, &queries, &options.collect)),
    )
    .await;

    // Step 4: Normalize per provider and concatenate.
    let normalize_context = NormalizeContext::new(&request.lang);
    let mut providers = Vec::with_capacity(outcomes.len());
    let mut tables = Vec::with_capacity(outcomes.len());
    let mut collected = 0;
    for outcome in outcomes {
        collected += outcome.rows.len();
        tables.push(normalize(
            outcome.report.provider,
            outcome.rows,
            &normalize_context,
        ));
        providers.push(outcome.report);
    }
    let mut table = concat(kind, tables);
    let mut stages = vec![
        StageCount {
            stage: "collected",
            rows: collected,
        },
        StageCount {
            stage: "normalized",
            rows: table.len(),
        },
    ];

    // Step 5: Tag.
    let matcher = TaxonomyMatcher::new(&request.taxonomy, &request.lang);
    matcher.tag_table(&mut table);

    // Step 6: Deduplicate.
    let table = dedupe_by_natural_key(table);
    stages.push(StageCount {
        stage: "deduplicated",
        rows: table.len(),
    });

    // Step 7: Filter.
    let context = FilterContext {
        queries: queries.clone(),
        today: options.today,
    };
    let outcome = chain.apply(table, &context, request.audit);
    let mut table = outcome.table;
    if kind == ResourceKind::Apps {
        sort_by_ratings(&mut table);
    }
    stages.push(StageCount {
        stage: "filtered",
        rows: table.len(),
    });

    tracing::info!(
        kind = %kind,
        collected,
        remaining = table.len(),
        "search complete"
    );

    Ok(SearchReport {
        kind,
        queries,
        table,
        audit: outcome.audit,
        tag_columns: matcher.keys(),
        stages,
        filter_steps: outcome.steps,
        providers,
    })
}

/// One request paired with the adapters that serve it.
#[derive(Clone)]
pub struct SearchJob {
    pub request: SearchRequest,
    pub adapters: Vec<Arc<dyn ProviderAdapter>>,
}

/// Runs independent searches (typically one per resource kind) concurrently.
/// Each result is reported separately; one failing does not affect the others.
pub async fn run_searches(
    jobs: &[SearchJob],
    options: &SearchOptions,
) -> Vec<Result<SearchReport, PipelineError>> {
    join_all(
        jobs.iter()
            .map(|job| run_search(&job.request, &job.adapters, options)),
    )
    .await
}

fn sort_by_ratings(table: &mut ResourceTable) {
    table.sort_by(|a, b| {
        let ra = a.get("ratings").as_f64().unwrap_or_default();
        let rb = b.get("ratings").as_f64().unwrap_or_default();
        rb.total_cmp(&ra)
    });
}
