//! Registry of login attempts awaiting their callback
//!
//! Every `/login` registers a [`PendingAuthorization`] under the freshly
//! minted `state` value.  The callback consumes it with a single
//! remove-under-lock, so at most one callback can ever exchange the code
//! belonging to a given state.
//!
//! Abandoned attempts are bounded by an optional time-to-live: expired
//! records are swept on each registration, and a consume that finds an
//! expired record removes it and reports it as missing.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// One in-flight authorization request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAuthorization {
    /// Session that started the login.
    pub session_id: String,

    /// Nonce sent in the authorization request.
    pub nonce: String,

    pub created_at: Instant,
}

impl PendingAuthorization {
    fn is_stale(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.created_at) > ttl)
    }
}

/// Thread-safe map from `state` to [`PendingAuthorization`].
///
/// # Examples
///
/// ```
/// use oidc_test_client::session::PendingAuthorizations;
///
/// let pending = PendingAuthorizations::new(None);
/// pending.register("state-1", "session-1", "nonce-1");
///
/// let record = pending.consume("state-1").unwrap();
/// assert_eq!(record.session_id, "session-1");
///
/// // Single use.
/// assert!(pending.consume("state-1").is_none());
/// ```
#[derive(Debug, Default)]
pub struct PendingAuthorizations {
    entries: Mutex<HashMap<String, PendingAuthorization>>,
    ttl: Option<Duration>,
}

impl PendingAuthorizations {
    /// Creates an empty registry; `None` keeps records until consumed.
    pub fn new(ttl: Option<Duration>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Builds a registry from a TTL in seconds, where `0` disables expiry.
    pub fn with_ttl_seconds(seconds: u64) -> Self {
        Self::new((seconds > 0).then(|| Duration::from_secs(seconds)))
    }

    /// Records a login attempt under `state`.
    pub fn register(&self, state: &str, session_id: &str, nonce: &str) {
        self.register_at(state, session_id, nonce, Instant::now());
    }

    fn register_at(&self, state: &str, session_id: &str, nonce: &str, now: Instant) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);

        let evicted = Self::evict_locked(&mut entries, self.ttl, now);
        if evicted > 0 {
            tracing::debug!(evicted, "Evicted abandoned login attempts");
        }

        entries.insert(
            state.to_string(),
            PendingAuthorization {
                session_id: session_id.to_string(),
                nonce: nonce.to_string(),
                created_at: now,
            },
        );
    }

    /// Removes and returns the record for `state`.
    ///
    /// Returns `None` for a state that was never registered, was already
    /// consumed, or has outlived the TTL.
    pub fn consume(&self, state: &str) -> Option<PendingAuthorization> {
        self.consume_at(state, Instant::now())
    }

    fn consume_at(&self, state: &str, now: Instant) -> Option<PendingAuthorization> {
        let record = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(state)?;

        if record.is_stale(self.ttl, now) {
            tracing::debug!("Rejected expired login attempt");
            return None;
        }
        Some(record)
    }

    /// Drops every record older than the TTL and returns how many went.
    pub fn evict_expired(&self) -> usize {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Self::evict_locked(&mut entries, self.ttl, Instant::now())
    }

    fn evict_locked(
        entries: &mut HashMap<String, PendingAuthorization>,
        ttl: Option<Duration>,
        now: Instant,
    ) -> usize {
        if ttl.is_none() {
            return 0;
        }
        let before = entries.len();
        entries.retain(|_, record| !record.is_stale(ttl, now));
        before - entries.len()
    }

    /// Number of outstanding login attempts.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when no login attempt is outstanding.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier};

    #[test]
    fn test_consume_returns_registered_record() {
        let pending = PendingAuthorizations::new(None);
        pending.register("st", "sess", "non");

        let record = pending.consume("st").unwrap();
        assert_eq!(record.session_id, "sess");
        assert_eq!(record.nonce, "non");
        assert!(pending.is_empty());
    }

    #[test]
    fn test_consume_unknown_state() {
        let pending = PendingAuthorizations::new(None);
        assert!(pending.consume("never-issued").is_none());
    }

    #[test]
    fn test_consume_is_single_use() {
        let pending = PendingAuthorizations::new(None);
        pending.register("st", "sess", "non");

        assert!(pending.consume("st").is_some());
        assert!(pending.consume("st").is_none());
    }

    #[test]
    fn test_concurrent_consume_has_one_winner() {
        let pending = Arc::new(PendingAuthorizations::new(None));
        pending.register("contested", "sess", "non");

        let threads = 16;
        let barrier = Arc::new(Barrier::new(threads));
        let winners = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let pending = Arc::clone(&pending);
                let barrier = Arc::clone(&barrier);
                let winners = Arc::clone(&winners);
                std::thread::spawn(move || {
                    barrier.wait();
                    if pending.consume("contested").is_some() {
                        winners.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(winners.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stale_record_is_not_consumable() {
        let pending = PendingAuthorizations::new(Some(Duration::from_secs(60)));
        let start = Instant::now();
        pending.register_at("st", "sess", "non", start);

        assert!(pending
            .consume_at("st", start + Duration::from_secs(61))
            .is_none());
        assert!(pending.is_empty(), "stale record must still be removed");
    }

    #[test]
    fn test_record_within_ttl_is_consumable() {
        let pending = PendingAuthorizations::new(Some(Duration::from_secs(60)));
        let start = Instant::now();
        pending.register_at("st", "sess", "non", start);

        assert!(pending
            .consume_at("st", start + Duration::from_secs(59))
            .is_some());
    }

    #[test]
    fn test_register_evicts_abandoned_attempts() {
        let pending = PendingAuthorizations::new(Some(Duration::from_secs(60)));
        let start = Instant::now();
        pending.register_at("old-1", "s", "n", start);
        pending.register_at("old-2", "s", "n", start);
        pending.register_at("fresh", "s", "n", start + Duration::from_secs(30));

        pending.register_at("new", "s", "n", start + Duration::from_secs(61));

        assert_eq!(pending.len(), 2);
        assert!(pending
            .consume_at("fresh", start + Duration::from_secs(62))
            .is_some());
        assert!(pending
            .consume_at("new", start + Duration::from_secs(62))
            .is_some());
    }

    #[test]
    fn test_zero_ttl_disables_eviction() {
        let pending = PendingAuthorizations::with_ttl_seconds(0);
        let start = Instant::now();
        pending.register_at("st", "s", "n", start);
        pending.register_at("other", "s", "n", start + Duration::from_secs(86_400));

        assert_eq!(pending.len(), 2);
        assert_eq!(pending.evict_expired(), 0);
        assert!(pending
            .consume_at("st", start + Duration::from_secs(86_401))
            .is_some());
    }
}
