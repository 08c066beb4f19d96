//! Single-use token bookkeeping.

use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::csrf::token::{is_past, CsrfToken, TokenIssue};
use crate::csrf::{CsrfRejection, CsrfValidation};
use crate::observability::metrics;

/// The set of outstanding CSRF tokens.
///
/// Consumption goes through `DashMap::remove`, which is atomic per key, so
/// two concurrent validations of the same token can never both succeed.
/// Expired entries are dropped when presented, and in bulk by
/// [`purge_expired`](Self::purge_expired). Issuance runs that purge itself
/// whenever the map has doubled since the last sweep, so tokens that are
/// fetched and never used cannot pile up.
#[derive(Debug)]
pub struct TokenStore {
    enabled: bool,
    ttl: Duration,
    /// value -> expiry
    tokens: DashMap<String, Instant>,
    /// Size at which the next issue sweeps expired entries.
    sweep_at: AtomicUsize,
}

/// Smallest map size that triggers a sweep on issue.
const SWEEP_THRESHOLD: usize = 1024;

impl TokenStore {
    pub fn new(enabled: bool, ttl: Duration) -> Self {
        Self {
            enabled,
            ttl,
            tokens: DashMap::new(),
            sweep_at: AtomicUsize::new(SWEEP_THRESHOLD),
        }
    }

    /// A store that accepts everything and never issues.
    pub fn disabled() -> Self {
        Self::new(false, Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Issue a new token, or [`TokenIssue::Disabled`].
    pub fn issue(&self) -> TokenIssue {
        self.issue_at(Instant::now())
    }

    /// [`issue`](Self::issue) against an explicit clock reading.
    pub fn issue_at(&self, now: Instant) -> TokenIssue {
        if !self.enabled {
            return TokenIssue::Disabled;
        }

        if self.tokens.len() >= self.sweep_at.load(Ordering::Relaxed) {
            let purged = self.purge_expired_at(now);
            let next = (self.tokens.len() * 2).max(SWEEP_THRESHOLD);
            self.sweep_at.store(next, Ordering::Relaxed);
            tracing::debug!(purged, next_sweep = next, "Swept expired CSRF tokens");
        }

        let token = CsrfToken::generate_at(self.ttl, now);
        self.tokens.insert(token.value.clone(), token.expires_at());
        metrics::record_csrf_issued();
        tracing::debug!(outstanding = self.tokens.len(), "Issued CSRF token");
        TokenIssue::Token(token)
    }

    /// Validate and consume a presented token.
    pub fn validate(&self, presented: Option<&str>) -> CsrfValidation {
        self.validate_at(presented, Instant::now())
    }

    /// [`validate`](Self::validate) against an explicit clock reading.
    pub fn validate_at(&self, presented: Option<&str>, now: Instant) -> CsrfValidation {
        if !self.enabled {
            return CsrfValidation::Accepted;
        }

        let Some(value) = presented.filter(|v| !v.is_empty()) else {
            return CsrfValidation::Rejected(CsrfRejection::Invalid);
        };

        let outcome = match self.tokens.remove(value) {
            None => CsrfValidation::Rejected(CsrfRejection::Invalid),
            Some((_, expires_at)) if is_past(expires_at, now) => {
                CsrfValidation::Rejected(CsrfRejection::Expired)
            }
            Some(_) => CsrfValidation::Accepted,
        };
        metrics::record_csrf_validation(outcome.label());
        outcome
    }

    /// Drop every expired token. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now())
    }

    pub fn purge_expired_at(&self, now: Instant) -> usize {
        let before = self.tokens.len();
        self.tokens.retain(|_, expires_at| !is_past(*expires_at, now));
        before.saturating_sub(self.tokens.len())
    }

    /// Outstanding (not yet consumed) tokens, expired or not.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn issue_value(store: &TokenStore) -> String {
        match store.issue() {
            TokenIssue::Token(t) => t.value,
            TokenIssue::Disabled => panic!("store is enabled"),
        }
    }

    #[test]
    fn test_single_use() {
        let store = TokenStore::new(true, Duration::from_secs(30));
        let token = issue_value(&store);

        assert_eq!(store.validate(Some(&token)), CsrfValidation::Accepted);
        assert_eq!(
            store.validate(Some(&token)),
            CsrfValidation::Rejected(CsrfRejection::Invalid)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_and_missing_tokens() {
        let store = TokenStore::new(true, Duration::from_secs(30));
        issue_value(&store);

        assert_eq!(
            store.validate(Some("forged")),
            CsrfValidation::Rejected(CsrfRejection::Invalid)
        );
        assert_eq!(
            store.validate(None),
            CsrfValidation::Rejected(CsrfRejection::Invalid)
        );
        assert_eq!(
            store.validate(Some("")),
            CsrfValidation::Rejected(CsrfRejection::Invalid)
        );
        // the real token is untouched
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expired_token() {
        let ttl = Duration::from_secs(30);
        let store = TokenStore::new(true, ttl);
        let token = issue_value(&store);

        let later = Instant::now() + ttl + Duration::from_secs(1);
        assert_eq!(
            store.validate_at(Some(&token), later),
            CsrfValidation::Rejected(CsrfRejection::Expired)
        );
        // presenting it removed it
        assert_eq!(
            store.validate(Some(&token)),
            CsrfValidation::Rejected(CsrfRejection::Invalid)
        );
    }

    #[test]
    fn test_disabled_accepts_anything() {
        let store = TokenStore::disabled();
        assert!(matches!(store.issue(), TokenIssue::Disabled));
        assert_eq!(store.validate(None), CsrfValidation::Accepted);
        assert_eq!(store.validate(Some("whatever")), CsrfValidation::Accepted);
        assert!(store.is_empty());
    }

    #[test]
    fn test_purge_expired() {
        let store = TokenStore::new(true, Duration::from_secs(30));
        issue_value(&store);
        issue_value(&store);
        assert_eq!(store.purge_expired(), 0);
        assert_eq!(store.len(), 2);

        let later = Instant::now() + Duration::from_secs(31);
        assert_eq!(store.purge_expired_at(later), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_issue_reclaims_abandoned_tokens() {
        let store = TokenStore::new(true, Duration::from_secs(1));
        let start = Instant::now();

        for _ in 0..SWEEP_THRESHOLD {
            store.issue_at(start);
        }
        assert_eq!(store.len(), SWEEP_THRESHOLD);

        // all of the above have expired by now; the next issue sweeps them
        let later = start + Duration::from_secs(2);
        store.issue_at(later);
        assert_eq!(store.len(), 1);

        for _ in 0..10 {
            store.issue_at(later);
        }
        assert_eq!(store.len(), 11);
    }

    #[test]
    fn test_live_tokens_survive_sweep() {
        let store = TokenStore::new(true, Duration::from_secs(30));
        let start = Instant::now();
        for _ in 0..=SWEEP_THRESHOLD {
            store.issue_at(start);
        }
        assert_eq!(store.len(), SWEEP_THRESHOLD + 1);
    }

    #[test]
    fn test_huge_ttl_does_not_panic() {
        let store = TokenStore::new(true, Duration::from_secs(u64::MAX));
        let token = issue_value(&store);
        assert_eq!(store.validate(Some(&token)), CsrfValidation::Accepted);
    }

    #[test]
    fn test_concurrent_validation_accepts_once() {
        let store = TokenStore::new(true, Duration::from_secs(30));
        let token = issue_value(&store);
        let accepted = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| {
                    if store.validate(Some(&token)) == CsrfValidation::Accepted {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(accepted.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_issue_and_consume() {
        let store = TokenStore::new(true, Duration::from_secs(30));

        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..50 {
                        let token = issue_value(&store);
                        assert_eq!(store.validate(Some(&token)), CsrfValidation::Accepted);
                    }
                });
            }
        });

        assert!(store.is_empty());
    }
}
