use std::io::Write;

use topfind_core::{build_app_config, AppConfig, ConfigStore, FilterSpec, ResourceKind};

use super::*;
use crate::configs::{saved_config, ConfigCommands};
use crate::search::{build_requests, read_filter_file, write_reports, SearchArgs};

fn defaults() -> AppConfig {
    build_app_config(|_| Err(std::env::VarError::NotPresent)).expect("default config")
}

fn search_args(argv: &[&str]) -> SearchArgs {
    let mut full = vec!["topfind", "search"];
    full.extend_from_slice(argv);
    match Cli::try_parse_from(full).expect("expected valid cli args").command {
        Commands::Search(args) => args,
        Commands::Config { .. } => panic!("expected search command"),
    }
}

#[test]
fn parses_search_with_repeated_and_comma_separated_kinds() {
    let args = search_args(&[
        "--kind", "apps,videos", "--kind", "news", "-q", "cancer", "-q", "support",
    ]);
    assert_eq!(
        args.kinds,
        vec![ResourceKind::Apps, ResourceKind::Videos, ResourceKind::News]
    );
    assert_eq!(args.inputs.queries, vec!["cancer", "support"]);
    assert!(!args.dry_run);
    assert!(!args.audit);
}

#[test]
fn search_requires_a_kind() {
    assert!(Cli::try_parse_from(["topfind", "search", "-q", "cancer"]).is_err());
}

#[test]
fn rejects_unknown_kind() {
    assert!(Cli::try_parse_from(["topfind", "search", "--kind", "books", "-q", "x"]).is_err());
}

#[test]
fn parses_search_flags() {
    let args = search_args(&[
        "--kind", "podcasts", "-q", "cancer", "--synonyms", "tumor, oncology",
        "--fields", "id,title", "--lang", "es", "--country", "mx", "--out", "/tmp/out",
        "--audit", "--dry-run",
    ]);
    assert_eq!(args.inputs.synonym_lists(), vec![vec!["tumor", "oncology"]]);
    assert_eq!(args.inputs.fields, vec!["id", "title"]);
    assert_eq!(args.inputs.lang.as_deref(), Some("es"));
    assert!(args.audit);
    assert!(args.dry_run);
}

#[test]
fn parses_config_list_without_kind() {
    let cli = Cli::try_parse_from(["topfind", "config", "list"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommands::List { kind: None }
        }
    ));
}

#[test]
fn parses_config_save() {
    let cli = Cli::try_parse_from([
        "topfind", "config", "save", "--kind", "news", "--name", "weekly", "-q", "cancer",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Config {
            command: ConfigCommands::Save { kind: ResourceKind::News, ref name, .. }
        } if name == "weekly"
    ));
}

#[test]
fn requests_use_configured_language_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ConfigStore::new(dir.path());
    let args = search_args(&["--kind", "apps", "-q", "cancer", "--synonyms", "tumor"]);

    let requests = build_requests(&args, &defaults(), &store).expect("requests");
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].lang, "en");
    assert_eq!(requests[0].country, "us");
    assert_eq!(requests[0].synonyms, vec![vec!["tumor".to_string()]]);
    assert!(requests[0].filters.is_none(), "default chain applies");
}

#[test]
fn requests_without_queries_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ConfigStore::new(dir.path());
    let args = search_args(&["--kind", "news"]);
    assert!(build_requests(&args, &defaults(), &store).is_err());
}

#[test]
fn saved_configuration_is_loaded_and_overridden() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ConfigStore::new(dir.path());
    let config = defaults();

    let save_args = search_args(&["--kind", "news", "-q", "cancer", "--lang", "es"]);
    let saved = saved_config(ResourceKind::News, &save_args.inputs, &config).expect("valid");
    store
        .save(ResourceKind::News, "weekly", &saved)
        .expect("save");

    let args = search_args(&["--kind", "news", "--config", "weekly", "--country", "MX"]);
    let requests = build_requests(&args, &config, &store).expect("requests");
    assert_eq!(requests[0].queries, vec!["cancer"]);
    assert_eq!(requests[0].lang, "es");
    assert_eq!(requests[0].country, "mx");
}

#[test]
fn missing_saved_configuration_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ConfigStore::new(dir.path());
    let args = search_args(&["--kind", "news", "--config", "nope"]);
    assert!(build_requests(&args, &defaults(), &store).is_err());
}

#[test]
fn filter_file_is_keyed_by_kind() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{"apps": {{"free": true, "score": 4}}, "news": {{"keywords_search": false}}}}"#
    )
    .expect("write");

    let filters = read_filter_file(file.path()).expect("parse filters");
    assert_eq!(
        filters.get(&ResourceKind::Apps),
        Some(&FilterSpec::new().with("free", true).with("score", 4_i64))
    );
    assert!(filters.contains_key(&ResourceKind::News));
}

#[test]
fn filter_file_with_unknown_kind_is_rejected() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, r#"{{"books": {{"free": true}}}}"#).expect("write");
    assert!(read_filter_file(file.path()).is_err());
}

#[test]
fn saving_rejects_invalid_filters() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(file, r#"{{"videos": {{"views": "lots"}}}}"#).expect("write");
    let path = file.path().to_str().expect("utf-8 path").to_string();

    let args = search_args(&["--kind", "videos", "-q", "cancer", "--filters", &path]);
    assert!(saved_config(ResourceKind::Videos, &args.inputs, &defaults()).is_err());
}

fn finished(kind: ResourceKind) -> topfind_pipeline::SearchReport {
    topfind_pipeline::SearchReport {
        kind,
        queries: vec!["cancer".to_string()],
        table: topfind_core::ResourceTable::new(kind, vec!["title".to_string()]),
        audit: None,
        tag_columns: Vec::new(),
        stages: Vec::new(),
        filter_steps: Vec::new(),
        providers: Vec::new(),
    }
}

fn job(kind: ResourceKind) -> topfind_pipeline::SearchJob {
    topfind_pipeline::SearchJob {
        request: topfind_pipeline::SearchRequest::new(kind, vec!["cancer".to_string()]),
        adapters: Vec::new(),
    }
}

#[test]
fn failed_export_does_not_stop_other_kinds() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the apps CSV should go makes that export fail.
    std::fs::create_dir(dir.path().join("search_apps.csv")).expect("blocking dir");

    let jobs = [job(ResourceKind::Apps), job(ResourceKind::News)];
    let results = vec![Ok(finished(ResourceKind::Apps)), Ok(finished(ResourceKind::News))];
    let err = write_reports(&jobs, results, dir.path()).expect_err("apps export fails");

    assert!(err.to_string().contains("apps: export failed"), "{err}");
    assert!(dir.path().join("search_news.csv").is_file());
}

#[test]
fn every_kind_written_reports_success() {
    let dir = tempfile::tempdir().expect("tempdir");
    let jobs = [job(ResourceKind::Videos), job(ResourceKind::Podcasts)];
    let results = vec![
        Ok(finished(ResourceKind::Videos)),
        Ok(finished(ResourceKind::Podcasts)),
    ];
    write_reports(&jobs, results, dir.path()).expect("both exported");
    assert!(dir.path().join("search_videos.csv").is_file());
    assert!(dir.path().join("search_podcasts.csv").is_file());
}
