//! Deadlines for per-item secondary lookups.
//!
//! An enrichment runs as its own task. When the deadline passes the task's
//! handle is dropped: the task is detached, never awaited again, and its
//! result (its only output) is discarded. Callers keep the partial row.
//!
//! Keyed lookups never hold the [`CredentialRing`]. The task gets a snapshot
//! of one credential and reports its outcome; the caller applies rotation or
//! success to the ring only for outcomes that arrived before the deadline.

use std::future::Future;
use std::time::{Duration, Instant};

use crate::credentials::{Credential, CredentialRing};
use crate::error::ScraperError;
use crate::provider::ProviderKind;

/// Default per-item enrichment deadline for `provider`.
#[must_use]
pub fn enrichment_deadline(provider: ProviderKind) -> Duration {
    match provider {
        ProviderKind::GooglePlay | ProviderKind::YouTube => Duration::from_secs(15),
        ProviderKind::GoogleNews => Duration::from_secs(10),
        ProviderKind::ApplePodcasts | ProviderKind::AppStore | ProviderKind::Spotify => {
            Duration::from_secs(3)
        }
    }
}

/// Runs `lookup` on a separate task and waits at most `deadline` for it.
///
/// # Errors
///
/// Returns [`ScraperError::Timeout`] when the deadline passes, the lookup's
/// own error when it fails, or [`ScraperError::Malformed`] if the task
/// panicked.
pub async fn with_deadline<T, Fut>(
    provider: ProviderKind,
    deadline: Duration,
    lookup: Fut,
) -> Result<T, ScraperError>
where
    T: Send + 'static,
    Fut: Future<Output = Result<T, ScraperError>> + Send + 'static,
{
    let handle = tokio::spawn(lookup);
    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(ScraperError::Malformed {
            provider: provider.to_string(),
            reason: format!("enrichment task failed: {join_err}"),
        }),
        Err(_) => {
            tracing::debug!(
                provider = %provider,
                deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
                "enrichment deadline passed, abandoning lookup"
            );
            Err(ScraperError::Timeout {
                provider: provider.to_string(),
                secs: deadline.as_secs(),
            })
        }
    }
}

/// Runs a credentialed lookup under `deadline`, rotating to the next
/// credential when an attempt reports quota exhaustion in time.
///
/// Every attempt shares the one deadline. A timed-out attempt leaves the ring
/// as it was.
///
/// # Errors
///
/// Returns [`ScraperError::MissingCredentials`] for an empty ring,
/// [`ScraperError::QuotaExceeded`] once every credential is exhausted,
/// [`ScraperError::Timeout`] when the deadline passes, or the lookup's own
/// error.
pub(crate) async fn keyed_with_deadline<T, F, Fut>(
    ring: &CredentialRing,
    provider: ProviderKind,
    deadline: Duration,
    mut lookup: F,
) -> Result<T, ScraperError>
where
    T: Send + 'static,
    F: FnMut(Credential) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>> + Send + 'static,
{
    if ring.is_empty() {
        return Err(ScraperError::MissingCredentials {
            provider: provider.to_string(),
            reason: "no API keys configured".to_string(),
        });
    }
    let started = Instant::now();
    loop {
        let Some(credential) = ring.current() else {
            return Err(ScraperError::QuotaExceeded {
                provider: provider.to_string(),
            });
        };
        let index = credential.index;
        let remaining = deadline.saturating_sub(started.elapsed());
        match with_deadline(provider, remaining, lookup(credential)).await {
            Ok(value) => {
                ring.mark_success();
                return Ok(value);
            }
            Err(e) if e.is_quota() => {
                if !ring.rotate(index) {
                    return Err(e);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn returns_lookup_result_within_deadline() {
        let result = with_deadline(ProviderKind::YouTube, Duration::from_secs(1), async {
            Ok::<_, ScraperError>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn times_out_slow_lookup() {
        let result = with_deadline(
            ProviderKind::ApplePodcasts,
            Duration::from_millis(20),
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok::<_, ScraperError>(())
            },
        )
        .await;
        assert!(matches!(result, Err(ScraperError::Timeout { .. })));
    }

    #[tokio::test]
    async fn abandoned_lookup_keeps_running_detached() {
        let finished = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&finished);
        let result = with_deadline(ProviderKind::YouTube, Duration::from_millis(10), async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            Ok::<_, ScraperError>(())
        })
        .await;
        assert!(result.is_err());
        assert!(!finished.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(
            finished.load(Ordering::SeqCst),
            "detached task should run to completion on its own"
        );
    }

    #[tokio::test]
    async fn propagates_lookup_error() {
        let result = with_deadline(ProviderKind::GooglePlay, Duration::from_secs(1), async {
            Err::<(), _>(ScraperError::NotFound {
                url: "https://example.com".to_owned(),
            })
        })
        .await;
        assert!(matches!(result, Err(ScraperError::NotFound { .. })));
    }

    fn ring(keys: &[&str]) -> CredentialRing {
        CredentialRing::new(keys.iter().map(|k| (*k).to_string()).collect())
    }

    fn quota() -> ScraperError {
        ScraperError::QuotaExceeded {
            provider: "google_play".to_owned(),
        }
    }

    #[tokio::test]
    async fn keyed_lookup_rotates_on_quota_within_deadline() {
        let ring = ring(&["spent", "fresh"]);
        let result = keyed_with_deadline(
            &ring,
            ProviderKind::GooglePlay,
            Duration::from_secs(1),
            |credential| async move {
                if credential.key == "spent" {
                    Err(quota())
                } else {
                    Ok(credential.key)
                }
            },
        )
        .await;
        assert_eq!(result.unwrap(), "fresh");
        assert_eq!(ring.current().unwrap().key, "fresh");
    }

    #[tokio::test]
    async fn late_quota_signal_does_not_rotate_the_ring() {
        let ring = ring(&["a", "b"]);
        let result: Result<(), _> = keyed_with_deadline(
            &ring,
            ProviderKind::GooglePlay,
            Duration::from_millis(20),
            |_| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Err(quota())
            },
        )
        .await;
        assert!(matches!(result, Err(ScraperError::Timeout { .. })));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(
            ring.current().unwrap().key,
            "a",
            "a timed-out lookup must leave the ring where it was"
        );
    }

    #[tokio::test]
    async fn late_success_does_not_reset_exhaustion() {
        let ring = ring(&["a", "b"]);
        assert!(ring.rotate(0));
        let result = keyed_with_deadline(
            &ring,
            ProviderKind::YouTube,
            Duration::from_millis(20),
            |_| async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok::<_, ScraperError>(())
            },
        )
        .await;
        assert!(result.is_err());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            !ring.rotate(1),
            "key a is still counted as exhausted, so b was the last one"
        );
    }

    #[tokio::test]
    async fn keyed_lookup_requires_credentials() {
        let ring = ring(&[]);
        let result: Result<(), _> = keyed_with_deadline(
            &ring,
            ProviderKind::YouTube,
            Duration::from_secs(1),
            |_| async { Ok(()) },
        )
        .await;
        assert!(matches!(result, Err(ScraperError::MissingCredentials { .. })));
    }
}
