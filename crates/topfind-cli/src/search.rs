//! `search` command: builds one request per resource kind, runs them
//! concurrently and writes one CSV per kind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use topfind_core::{
    load_taxonomy, AppConfig, ConfigStore, FilterSpec, ResourceKind, SearchConfig, Taxonomy,
};
use topfind_pipeline::{
    expand, run_searches, PipelineError, SearchJob, SearchOptions, SearchReport, SearchRequest,
};
use topfind_scraper::{build_adapters, CancelFlag, CollectOptions, SearchContext};

/// Inputs shared by `search` and `config save`.
#[derive(Debug, Clone, Default, Args)]
pub struct SearchInputs {
    /// Base search term; repeat for each term
    #[arg(long = "query", short = 'q')]
    pub queries: Vec<String>,
    /// Comma-separated synonyms for the query at the same position
    #[arg(long = "synonyms")]
    pub synonyms: Vec<String>,
    /// JSON file of filters keyed by resource kind
    #[arg(long)]
    pub filters: Option<PathBuf>,
    /// YAML or JSON taxonomy file
    #[arg(long)]
    pub taxonomy: Option<PathBuf>,
    /// Comma-separated export fields (default: all)
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,
    /// ISO 639-1 language code
    #[arg(long)]
    pub lang: Option<String>,
    /// ISO 3166-1 country code
    #[arg(long)]
    pub country: Option<String>,
}

impl SearchInputs {
    /// One list per `--synonyms` flag, split on commas.
    pub fn synonym_lists(&self) -> Vec<Vec<String>> {
        self.synonyms
            .iter()
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .collect()
    }

    pub fn load_taxonomy(&self) -> anyhow::Result<Option<Taxonomy>> {
        self.taxonomy
            .as_deref()
            .map(|path| {
                load_taxonomy(path)
                    .with_context(|| format!("failed to load taxonomy {}", path.display()))
            })
            .transpose()
    }

    pub fn load_filters(&self) -> anyhow::Result<BTreeMap<ResourceKind, FilterSpec>> {
        match &self.filters {
            Some(path) => read_filter_file(path),
            None => Ok(BTreeMap::new()),
        }
    }
}

/// Reads `{"apps": {...}, "videos": {...}}`. Kinds left out run their
/// default chain.
pub fn read_filter_file(path: &Path) -> anyhow::Result<BTreeMap<ResourceKind, FilterSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read filters {}", path.display()))?;
    let raw: BTreeMap<String, FilterSpec> = serde_json::from_str(&content)
        .with_context(|| format!("filters {} must map resource kinds to objects", path.display()))?;
    raw.into_iter()
        .map(|(kind, spec)| {
            let kind = kind.parse::<ResourceKind>().map_err(anyhow::Error::msg)?;
            Ok((kind, spec))
        })
        .collect()
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Resource kinds to search (apps, videos, podcasts, news); repeat or comma-separate
    #[arg(long = "kind", short = 'k', value_delimiter = ',', required = true)]
    pub kinds: Vec<ResourceKind>,
    #[command(flatten)]
    pub inputs: SearchInputs,
    /// Load a saved configuration of this name for each kind
    #[arg(long)]
    pub config: Option<String>,
    /// Output directory (default: `TOPFIND_OUTPUT_DIR`)
    #[arg(long)]
    pub out: Option<PathBuf>,
    /// Also write a per-filter audit CSV
    #[arg(long)]
    pub audit: bool,
    /// Validate and print the expanded queries without searching
    #[arg(long)]
    pub dry_run: bool,
}

/// Applies a saved configuration to a fresh request.
pub fn request_from_saved(kind: ResourceKind, saved: &SearchConfig) -> SearchRequest {
    let mut request = SearchRequest::new(kind, saved.queries.clone());
    request.synonyms.clone_from(&saved.queries_synonyms);
    request.filters = (!saved.filter_values.is_empty()).then(|| saved.filter_values.clone());
    request.fields.clone_from(&saved.metadata);
    request.taxonomy = saved.taxonomy.clone();
    request.lang.clone_from(&saved.lang);
    request.country.clone_from(&saved.country);
    request
}

/// Builds one request per requested kind. Command-line inputs override a
/// saved configuration field by field.
pub fn build_requests(
    args: &SearchArgs,
    config: &AppConfig,
    store: &ConfigStore,
) -> anyhow::Result<Vec<SearchRequest>> {
    let inputs = &args.inputs;
    let taxonomy = inputs.load_taxonomy()?;
    let mut filters = inputs.load_filters()?;

    let mut requests = Vec::with_capacity(args.kinds.len());
    for &kind in &args.kinds {
        let mut request = match &args.config {
            Some(name) => {
                let saved = store
                    .load(kind, name)?
                    .with_context(|| format!("no saved {kind} configuration named '{name}'"))?;
                request_from_saved(kind, &saved)
            }
            None => {
                let mut request = SearchRequest::new(kind, Vec::new());
                request.lang.clone_from(&config.default_lang);
                request.country.clone_from(&config.default_country);
                request
            }
        };

        if !inputs.queries.is_empty() {
            request.queries.clone_from(&inputs.queries);
            request.synonyms = inputs.synonym_lists();
        }
        if let Some(spec) = filters.remove(&kind) {
            request.filters = Some(spec);
        }
        if !inputs.fields.is_empty() {
            request.fields.clone_from(&inputs.fields);
        }
        if let Some(taxonomy) = &taxonomy {
            request.taxonomy = taxonomy.clone();
        }
        if let Some(lang) = &inputs.lang {
            request.lang = lang.trim().to_ascii_lowercase();
        }
        if let Some(country) = &inputs.country {
            request.country = country.trim().to_ascii_lowercase();
        }
        request.audit = args.audit;

        if request.queries.is_empty() {
            anyhow::bail!("no queries for {kind}: pass --query or --config");
        }
        requests.push(request);
    }

    if let Some(kind) = filters.keys().next() {
        anyhow::bail!("filters given for {kind}, which is not being searched");
    }
    Ok(requests)
}

pub async fn run(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let store = ConfigStore::new(&config.configs_dir);
    let requests = build_requests(&args, config, &store)?;
    for request in &requests {
        request
            .validate()
            .with_context(|| format!("invalid {} search", request.kind))?;
    }

    if args.dry_run {
        for request in &requests {
            print_plan(request);
        }
        return Ok(());
    }

    let cancel = CancelFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, finishing queries already in flight");
            on_interrupt.cancel();
        }
    });

    let options = SearchOptions {
        collect: CollectOptions {
            max_concurrent_parses: config.max_concurrent_enrichments.max(1),
            cancel,
        },
        ..SearchOptions::default()
    };

    let mut jobs = Vec::with_capacity(requests.len());
    for request in requests {
        let context = SearchContext::new(&request.lang, &request.country);
        let adapters = build_adapters(request.kind, config, &context)?;
        if adapters.is_empty() {
            tracing::warn!(kind = %request.kind, "no provider configured, results will be empty");
        }
        jobs.push(SearchJob { request, adapters });
    }

    let out_dir = args.out.unwrap_or_else(|| config.output_dir.clone());
    let results = run_searches(&jobs, &options).await;

    write_reports(&jobs, results, &out_dir)
}

/// Prints and exports every finished search. A failed search or export is
/// logged and the remaining kinds still get written.
pub fn write_reports(
    jobs: &[SearchJob],
    results: Vec<Result<SearchReport, PipelineError>>,
    out_dir: &Path,
) -> anyhow::Result<()> {
    let mut failed = Vec::new();
    for (job, result) in jobs.iter().zip(results) {
        let kind = job.request.kind;
        let report = match result {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "search failed");
                failed.push(format!("{kind}: search failed"));
                continue;
            }
        };
        print_report(&report);
        match report.export(out_dir, &job.request.fields) {
            Ok(paths) => {
                for path in paths {
                    println!("  wrote {}", path.display());
                }
            }
            Err(e) => {
                tracing::error!(kind = %kind, error = %e, "export failed");
                failed.push(format!("{kind}: export failed"));
            }
        }
    }

    failure_summary(&failed, jobs.len())
}

/// One error naming every kind that failed to search or export.
fn failure_summary(failed: &[String], total: usize) -> anyhow::Result<()> {
    if failed.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "{} of {total} searches did not complete ({})",
        failed.len(),
        failed.join(", ")
    )
}

fn print_plan(request: &SearchRequest) {
    let queries = expand(&request.queries, &request.synonyms);
    println!(
        "dry-run: {} ({}/{}) would run {} queries:",
        request.kind,
        request.lang,
        request.country,
        queries.len()
    );
    for query in &queries {
        println!("  {query}");
    }
    let filters = request.effective_filters();
    if filters.is_empty() {
        println!("  no filters");
    }
    for (name, value) in filters.iter() {
        println!("  filter {name} = {value}");
    }
}

fn print_report(report: &SearchReport) {
    println!("{}: {} results", report.kind, report.table.len());
    for provider in &report.providers {
        println!(
            "  {}: {} queries ({} failed), {} parsed, {} dropped, {} degraded{}{}",
            provider.provider,
            provider.queries_attempted,
            provider.queries_failed,
            provider.parsed,
            provider.dropped,
            provider.degraded,
            if provider.quota_exhausted { ", quota exhausted" } else { "" },
            if provider.cancelled { ", cancelled" } else { "" },
        );
    }
    for stage in &report.stages {
        println!("  {:<13} {}", stage.stage, stage.rows);
    }
    for step in &report.filter_steps {
        println!(
            "  filter {}={}: {} -> {}",
            step.name, step.value, step.before, step.after
        );
    }
}
