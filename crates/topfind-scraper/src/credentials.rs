//! Credential rotation for providers that enforce per-key quotas.
//!
//! The ring owns the current credential index. It advances only when a
//! request made with the current credential reports quota exhaustion, and
//! wraps back to the first credential after the last. Once every credential
//! has reported exhaustion without an intervening success, rotation stops
//! and callers surface [`crate::ScraperError::QuotaExceeded`].

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use crate::error::ScraperError;
use crate::provider::ProviderKind;

/// A credential handed out by [`CredentialRing::current`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub index: usize,
    pub key: String,
}

#[derive(Debug)]
pub struct CredentialRing {
    keys: Vec<String>,
    state: Mutex<RingState>,
}

#[derive(Debug, Default)]
struct RingState {
    index: usize,
    exhausted: usize,
}

impl CredentialRing {
    #[must_use]
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            state: Mutex::new(RingState::default()),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The credential requests should use right now, or `None` when the
    /// ring is empty or every credential is exhausted.
    #[must_use]
    pub fn current(&self) -> Option<Credential> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.exhausted >= self.keys.len() {
            return None;
        }
        self.keys.get(state.index).map(|key| Credential {
            index: state.index,
            key: key.clone(),
        })
    }

    /// Records a quota signal for the credential at `failed_index` and
    /// advances to the next one.
    ///
    /// Returns `true` when another credential is available to retry with.
    /// Concurrent callers reporting the same exhausted credential advance
    /// the ring only once.
    pub fn rotate(&self, failed_index: usize) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if self.keys.is_empty() {
            return false;
        }
        if state.index != failed_index {
            // Someone else already moved past this credential.
            return state.exhausted < self.keys.len();
        }
        state.exhausted += 1;
        if state.exhausted >= self.keys.len() {
            tracing::warn!(
                credentials = self.keys.len(),
                "every credential reported quota exhaustion"
            );
            return false;
        }
        state.index = (state.index + 1) % self.keys.len();
        tracing::info!(
            index = state.index,
            credentials = self.keys.len(),
            "rotated to next credential after quota signal"
        );
        true
    }

    /// Resets the exhaustion count after a request succeeds.
    pub fn mark_success(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.exhausted = 0;
    }
}

/// Runs `request` with the ring's current credential, rotating and trying
/// again whenever it reports quota exhaustion.
///
/// # Errors
///
/// Returns [`ScraperError::MissingCredentials`] for an empty ring,
/// [`ScraperError::QuotaExceeded`] once every credential is exhausted, or the
/// request's own error.
pub(crate) async fn with_rotation<T, F, Fut>(
    ring: &CredentialRing,
    provider: ProviderKind,
    mut request: F,
) -> Result<T, ScraperError>
where
    F: FnMut(Credential) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    if ring.is_empty() {
        return Err(ScraperError::MissingCredentials {
            provider: provider.to_string(),
            reason: "no API keys configured".to_string(),
        });
    }
    loop {
        let Some(credential) = ring.current() else {
            return Err(ScraperError::QuotaExceeded {
                provider: provider.to_string(),
            });
        };
        let index = credential.index;
        match request(credential).await {
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
    use super::*;

    fn ring(keys: &[&str]) -> CredentialRing {
        CredentialRing::new(keys.iter().map(|k| (*k).to_string()).collect())
    }

    #[test]
    fn empty_ring_has_no_current_and_cannot_rotate() {
        let ring = ring(&[]);
        assert!(ring.current().is_none());
        assert!(!ring.rotate(0));
    }

    #[test]
    fn single_key_cannot_rotate() {
        let ring = ring(&["only"]);
        assert_eq!(ring.current().unwrap().key, "only");
        assert!(!ring.rotate(0));
        assert!(ring.current().is_none(), "exhausted ring hands out nothing");
    }

    #[test]
    fn rotates_through_every_key_then_stops() {
        let ring = ring(&["a", "b", "c"]);
        assert!(ring.rotate(0));
        assert_eq!(ring.current().unwrap().key, "b");
        assert!(ring.rotate(1));
        assert_eq!(ring.current().unwrap().key, "c");
        assert!(!ring.rotate(2));
        assert!(ring.current().is_none());
    }

    #[test]
    fn wraps_around_after_success() {
        let ring = ring(&["a", "b"]);
        assert!(ring.rotate(0));
        ring.mark_success();
        assert!(ring.rotate(1));
        assert_eq!(
            ring.current().unwrap(),
            Credential {
                index: 0,
                key: "a".to_string()
            }
        );
    }

    #[tokio::test]
    async fn with_rotation_retries_on_next_key() {
        let ring = ring(&["spent", "fresh"]);
        let result = with_rotation(&ring, ProviderKind::YouTube, |cred| async move {
            if cred.key == "spent" {
                Err(ScraperError::QuotaExceeded {
                    provider: "youtube".to_owned(),
                })
            } else {
                Ok(cred.key)
            }
        })
        .await;
        assert_eq!(result.unwrap(), "fresh");
    }

    #[tokio::test]
    async fn with_rotation_surfaces_quota_when_all_keys_spent() {
        let ring = ring(&["a", "b"]);
        let result: Result<(), _> = with_rotation(&ring, ProviderKind::YouTube, |_| async {
            Err(ScraperError::QuotaExceeded {
                provider: "youtube".to_owned(),
            })
        })
        .await;
        assert!(matches!(result, Err(ScraperError::QuotaExceeded { .. })));
    }

    #[tokio::test]
    async fn with_rotation_requires_credentials() {
        let ring = ring(&[]);
        let result: Result<(), _> = with_rotation(&ring, ProviderKind::GooglePlay, |_| async { Ok(()) }).await;
        assert!(matches!(result, Err(ScraperError::MissingCredentials { .. })));
    }

    #[test]
    fn stale_rotation_does_not_skip_a_key() {
        let ring = ring(&["a", "b", "c"]);
        assert!(ring.rotate(0));
        // A second request that also used key 0 reports late.
        assert!(ring.rotate(0));
        assert_eq!(ring.current().unwrap().key, "b");
    }
}
