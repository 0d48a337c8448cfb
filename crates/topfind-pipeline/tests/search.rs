//! End-to-end search runs against in-memory adapters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value as JsonValue};
use topfind_core::{FilterSpec, ResourceKind, Taxonomy, Value};
use topfind_pipeline::{
    run_search, run_searches, SearchJob, SearchOptions, SearchRequest, StageCount,
};
use topfind_scraper::{
    CollectOptions, ProviderAdapter, ProviderKind, ProviderRow, RawItem, ScraperError,
};

/// Serves canned results per query and remembers what it was asked.
struct FakeAdapter {
    kind: ProviderKind,
    results: HashMap<String, Vec<JsonValue>>,
    quota_exhausted: bool,
    searched: Mutex<Vec<String>>,
}

impl FakeAdapter {
    fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            results: HashMap::new(),
            quota_exhausted: false,
            searched: Mutex::new(Vec::new()),
        }
    }

    fn with_results(mut self, query: &str, items: Vec<JsonValue>) -> Self {
        self.results.insert(query.to_string(), items);
        self
    }

    fn out_of_quota(mut self) -> Self {
        self.quota_exhausted = true;
        self
    }

    fn searched(&self) -> Vec<String> {
        self.searched.lock().expect("lock").clone()
    }
}

#[async_trait]
impl ProviderAdapter for FakeAdapter {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, ScraperError> {
        self.searched.lock().expect("lock").push(query.to_string());
        if self.quota_exhausted {
            return Err(ScraperError::QuotaExceeded {
                provider: self.kind.to_string(),
            });
        }
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn parse(&self, item: RawItem) -> Result<ProviderRow, ScraperError> {
        Ok(ProviderRow::from_object(self.kind, item))
    }
}

fn options() -> SearchOptions {
    SearchOptions {
        collect: CollectOptions::default(),
        today: NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date"),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

fn column(report_table: &topfind_core::ResourceTable, name: &str) -> Vec<String> {
    report_table
        .rows()
        .iter()
        .map(|r| r.get(name).to_string())
        .collect()
}

fn app_adapters() -> (Arc<FakeAdapter>, Arc<FakeAdapter>) {
    let play = FakeAdapter::new(ProviderKind::GooglePlay).with_results(
        "cancer support",
        vec![
            json!({"appId": "com.a", "title": "Cancer Support Hub", "free": "True",
                   "score": 4.5, "ratings": 1200}),
            json!({"appId": "com.b", "title": "Cancer support pro", "free": "False",
                   "score": 4.0, "ratings": 50}),
            json!({"appId": "com.c", "title": "Cancer support lite", "free": "True"}),
        ],
    );
    let store = FakeAdapter::new(ProviderKind::AppStore).with_results(
        "cancer support",
        vec![
            json!({"bundleId": "com.a", "trackName": "Cancer Support Hub", "price": 0,
                   "averageUserRating": 4.8, "userRatingCount": 300}),
            json!({"bundleId": "com.d", "trackName": "Support for cancer", "price": 0,
                   "averageUserRating": 3.9, "userRatingCount": 5000}),
            json!({"bundleId": "com.e", "trackName": "Support for cancer plus", "price": 2.99,
                   "averageUserRating": 4.2, "userRatingCount": 10}),
        ],
    );
    (Arc::new(play), Arc::new(store))
}

#[tokio::test]
async fn apps_are_merged_deduplicated_filtered_and_ranked() {
    let (play, store) = app_adapters();
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![play, store];

    let mut request = SearchRequest::new(ResourceKind::Apps, strings(&["cancer", "support"]));
    request.filters = Some(FilterSpec::new().with("free", true).with("score", 3_i64));

    let report = run_search(&request, &adapters, &options())
        .await
        .expect("search should succeed");

    assert_eq!(report.queries, vec!["cancer support"]);
    // com.c is unrated and survives the score filter; order is by ratings.
    assert_eq!(column(&report.table, "appId"), vec!["com.d", "com.a", "com.c"]);
    // The duplicate com.a from the App Store is dropped; the Play row is kept.
    assert_eq!(column(&report.table, "os")[1], "Android");

    assert_eq!(
        report.stages,
        vec![
            StageCount { stage: "collected", rows: 6 },
            StageCount { stage: "normalized", rows: 6 },
            StageCount { stage: "deduplicated", rows: 5 },
            StageCount { stage: "filtered", rows: 3 },
        ]
    );
    let steps: Vec<(&str, usize, usize)> = report
        .filter_steps
        .iter()
        .map(|s| (s.name.as_str(), s.before, s.after))
        .collect();
    assert_eq!(steps, vec![("free", 5, 3), ("score", 3, 3)]);
    assert_eq!(report.providers.len(), 2);
    assert!(report.audit.is_none());
}

#[tokio::test]
async fn validation_failure_issues_no_queries() {
    let adapter = Arc::new(FakeAdapter::new(ProviderKind::GooglePlay));
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![adapter.clone()];

    let mut request = SearchRequest::new(ResourceKind::Apps, strings(&["cancer"]));
    request.filters = Some(FilterSpec::new().with("free", true).with("bogus", 1_i64));

    let err = run_search(&request, &adapters, &options())
        .await
        .expect_err("unknown filter must fail");
    assert!(err.is_validation());
    assert!(adapter.searched().is_empty());
}

#[tokio::test]
async fn bad_export_field_is_rejected_before_search() {
    let adapter = Arc::new(FakeAdapter::new(ProviderKind::YouTube));
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![adapter.clone()];

    let mut request = SearchRequest::new(ResourceKind::Videos, strings(&["cancer"]));
    request.fields = strings(&["title", "appId"]);

    let err = run_search(&request, &adapters, &options())
        .await
        .expect_err("appId is not a video field");
    assert!(err.is_validation());
    assert!(adapter.searched().is_empty());
}

#[tokio::test]
async fn every_expanded_query_is_searched() {
    let adapter = Arc::new(FakeAdapter::new(ProviderKind::GoogleNews));
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![adapter.clone()];

    let mut request = SearchRequest::new(ResourceKind::News, strings(&["cancer", "support"]));
    request.synonyms = vec![strings(&["tumor"]), strings(&["help"])];
    request.filters = Some(FilterSpec::new());

    let report = run_search(&request, &adapters, &options())
        .await
        .expect("search");
    let expected = strings(&["cancer support", "cancer help", "tumor support", "tumor help"]);
    assert_eq!(report.queries, expected);
    assert_eq!(adapter.searched(), expected);
    assert!(report.table.is_empty());
    assert!(report.table.has_column("URL"));
}

#[tokio::test]
async fn news_rows_are_tagged_and_keyword_filtered() {
    let adapter = FakeAdapter::new(ProviderKind::GoogleNews).with_results(
        "breast cancer",
        vec![
            json!({"title": "Breast Cancer Awareness", "url": "https://news.example/1",
                   "description": "Screening month begins"}),
            json!({"title": "Breast Cancer Awareness", "url": "https://news.example/2"}),
            json!({"title": "Stock markets rally", "url": "https://news.example/3"}),
        ],
    );
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![Arc::new(adapter)];

    let mut request = SearchRequest::new(ResourceKind::News, strings(&["breast cancer"]));
    request.taxonomy = Taxonomy::default().with_term("cancerTypes", "breast", &["breast", "mammary"]);
    request.audit = true;

    let report = run_search(&request, &adapters, &options())
        .await
        .expect("search");

    assert_eq!(column(&report.table, "URL"), vec!["https://news.example/1"]);
    assert_eq!(report.tag_columns, vec!["cancerTypes.breast"]);
    assert_eq!(
        report.table.rows()[0].get("cancerTypes.breast"),
        &Value::List(vec!["breast".to_string()])
    );

    let audit = report.audit.expect("audit requested");
    assert_eq!(audit.len(), 2);
    assert_eq!(
        column(&audit, "passed_keywords_search"),
        vec!["true", "false"]
    );
}

#[tokio::test]
async fn quota_exhaustion_keeps_other_providers() {
    let (play, _) = app_adapters();
    let store = Arc::new(FakeAdapter::new(ProviderKind::AppStore).out_of_quota());
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![play, store.clone()];

    let mut request = SearchRequest::new(ResourceKind::Apps, strings(&["cancer", "support"]));
    request.synonyms = vec![strings(&["tumor"])];
    request.filters = Some(FilterSpec::new());

    let report = run_search(&request, &adapters, &options())
        .await
        .expect("search");

    assert_eq!(report.table.len(), 3);
    assert_eq!(store.searched().len(), 1, "no queries after quota is spent");
    let store_report = report
        .providers
        .iter()
        .find(|p| p.provider == ProviderKind::AppStore)
        .expect("app store report");
    assert!(store_report.quota_exhausted);
}

#[tokio::test]
async fn concurrent_searches_are_independent() {
    let (play, store) = app_adapters();
    let good = SearchJob {
        request: {
            let mut r = SearchRequest::new(ResourceKind::Apps, strings(&["cancer", "support"]));
            r.filters = Some(FilterSpec::new().with("free", true));
            r
        },
        adapters: vec![play, store],
    };
    let bad = SearchJob {
        request: {
            let mut r = SearchRequest::new(ResourceKind::Podcasts, strings(&["cancer"]));
            r.filters = Some(FilterSpec::new().with("free", "yes"));
            r
        },
        adapters: vec![Arc::new(FakeAdapter::new(ProviderKind::ApplePodcasts))],
    };

    let results = run_searches(&[good, bad], &options()).await;
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().map(|r| r.table.len()).ok(), Some(3));
    assert!(results[1].as_ref().is_err_and(topfind_pipeline::PipelineError::is_validation));
}

#[tokio::test]
async fn report_exports_table_and_audit() {
    let (play, store) = app_adapters();
    let adapters: Vec<Arc<dyn ProviderAdapter>> = vec![play, store];
    let mut request = SearchRequest::new(ResourceKind::Apps, strings(&["cancer", "support"]));
    request.filters = Some(FilterSpec::new().with("free", true));
    request.audit = true;

    let report = run_search(&request, &adapters, &options())
        .await
        .expect("search");

    let dir = tempfile::tempdir().expect("tempdir");
    let written = report
        .export(dir.path(), &strings(&["appId", "title", "free"]))
        .expect("export");
    assert_eq!(
        written,
        vec![
            dir.path().join("search_apps.csv"),
            dir.path().join("search_apps_audit.csv"),
        ]
    );

    let csv = std::fs::read_to_string(&written[0]).expect("read csv");
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("appId,title,free"));
    assert_eq!(lines.count(), 3);

    let audit = std::fs::read_to_string(&written[1]).expect("read audit");
    assert_eq!(audit.lines().next(), Some("appId,title,free,passed_free"));
    assert_eq!(audit.lines().count(), 6);
}
