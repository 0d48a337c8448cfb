//! Drives one adapter across every expanded query.
//!
//! Query-level failures are logged and skipped. A quota signal that the
//! adapter could not rotate past ends the provider's run; rows gathered so
//! far are kept. Item-level parse failures drop the item and are counted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use crate::error::ScraperError;
use crate::provider::{ProviderAdapter, ProviderKind, ProviderRow};

/// Cooperative cancellation shared between the caller and running searches.
///
/// Once set, no further provider queries are issued. Parses already under
/// way finish or time out on their own.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Upper bound on concurrent `parse` calls for one query's results.
    pub max_concurrent_parses: usize,
    pub cancel: CancelFlag,
}

impl Default for CollectOptions {
    fn default() -> Self {
        Self {
            max_concurrent_parses: 8,
            cancel: CancelFlag::new(),
        }
    }
}

/// What happened while collecting from one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReport {
    pub provider: ProviderKind,
    pub queries_attempted: usize,
    pub queries_failed: usize,
    pub raw_items: usize,
    pub parsed: usize,
    pub dropped: usize,
    pub degraded: usize,
    pub quota_exhausted: bool,
    pub cancelled: bool,
}

impl ProviderReport {
    #[must_use]
    pub fn new(provider: ProviderKind) -> Self {
        Self {
            provider,
            queries_attempted: 0,
            queries_failed: 0,
            raw_items: 0,
            parsed: 0,
            dropped: 0,
            degraded: 0,
            quota_exhausted: false,
            cancelled: false,
        }
    }
}

#[derive(Debug)]
pub struct ProviderOutcome {
    pub rows: Vec<ProviderRow>,
    pub report: ProviderReport,
}

/// Searches every query with `adapter` and parses the results.
///
/// Never fails: provider and item failures are absorbed into the returned
/// [`ProviderReport`].
pub async fn collect(
    adapter: &dyn ProviderAdapter,
    queries: &[String],
    options: &CollectOptions,
) -> ProviderOutcome {
    let provider = adapter.kind();
    let mut report = ProviderReport::new(provider);
    let mut rows = Vec::new();

    for query in queries {
        if options.cancel.is_cancelled() {
            report.cancelled = true;
            tracing::info!(provider = %provider, "search cancelled, no further queries issued");
            break;
        }

        report.queries_attempted += 1;
        let raw = match adapter.search(query).await {
            Ok(raw) => raw,
            Err(e) if e.is_quota() => {
                report.queries_failed += 1;
                report.quota_exhausted = true;
                tracing::warn!(
                    provider = %provider,
                    query = %query,
                    error = %e,
                    "quota exhausted, skipping remaining queries for provider"
                );
                break;
            }
            Err(e) => {
                report.queries_failed += 1;
                tracing::warn!(provider = %provider, query = %query, error = %e, "search failed");
                continue;
            }
        };

        tracing::debug!(provider = %provider, query = %query, count = raw.len(), "search returned items");
        report.raw_items += raw.len();

        let parsed: Vec<Result<ProviderRow, ScraperError>> = stream::iter(raw)
            .map(|item| adapter.parse(item))
            .buffered(options.max_concurrent_parses.max(1))
            .collect()
            .await;

        for result in parsed {
            match result {
                Ok(row) => {
                    if row.degraded {
                        report.degraded += 1;
                    }
                    report.parsed += 1;
                    rows.push(row);
                }
                Err(e) => {
                    report.dropped += 1;
                    tracing::debug!(provider = %provider, error = %e, "dropping item that failed to parse");
                }
            }
        }
    }

    if report.dropped > 0 {
        tracing::warn!(provider = %provider, dropped = report.dropped, "items dropped during parse");
    }
    tracing::info!(
        provider = %provider,
        queries = report.queries_attempted,
        failed = report.queries_failed,
        parsed = report.parsed,
        degraded = report.degraded,
        "provider collection finished"
    );

    ProviderOutcome { rows, report }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
