//! Session registry
//!
//! Maps client-visible session ids to the provider they are bound to and the
//! backend-side handle that provider uses to keep conversation state.
//! Entries expire after an idle TTL that refreshes on every use.
//!
//! # Thread Safety
//!
//! Every create-or-refresh runs under the write lock, so two concurrent requests
//! carrying the same new id observe the same backend handle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Longest pause between periodic eviction sweeps
const MAX_EVICTION_PERIOD: Duration = Duration::from_secs(60);

/// A client session bound to one provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: String,
    pub provider: String,
    /// Identifier the backend uses for its conversation state
    pub backend_handle: String,
    /// Unix timestamp (seconds)
    pub created_at: i64,
    /// Unix timestamp (seconds)
    pub last_used_at: i64,
}

impl Session {
    fn new(id: String, provider: &str) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id,
            provider: provider.to_string(),
            backend_handle: new_backend_handle(),
            created_at: now,
            last_used_at: now,
        }
    }
}

struct SessionEntry {
    session: Session,
    last_used: Instant,
}

impl SessionEntry {
    fn is_expired(&self, ttl: Option<Duration>) -> bool {
        ttl.map(|ttl| self.last_used.elapsed() > ttl).unwrap_or(false)
    }

    fn refresh(&mut self) {
        self.last_used = Instant::now();
        self.session.last_used_at = Utc::now().timestamp();
    }
}

/// In-memory session registry with idle expiry
pub struct SessionRegistry {
    entries: RwLock<HashMap<String, SessionEntry>>,
    /// `None` disables expiry
    ttl: Option<Duration>,
}

impl SessionRegistry {
    /// Create a registry whose entries expire after `ttl_seconds` idle (0 = never)
    pub fn new(ttl_seconds: u64) -> Self {
        Self::with_ttl((ttl_seconds > 0).then(|| Duration::from_secs(ttl_seconds)))
    }

    pub fn with_ttl(ttl: Option<Duration>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Return the live session for `client_id`, creating it if needed
    ///
    /// - live id: refreshed and returned
    /// - unknown or expired id: created under that id
    /// - no id: created under a fresh uuid
    ///
    /// A live session bound to a different provider gets a fresh backend handle,
    /// since handles are never shared across providers.
    #[instrument(skip(self))]
    pub fn resolve(&self, client_id: Option<&str>, provider: &str) -> Session {
        let id = client_id
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get_mut(&id) {
            if !entry.is_expired(self.ttl) {
                if entry.session.provider != provider {
                    info!(
                        session_id = %id,
                        from = %entry.session.provider,
                        to = %provider,
                        "Session switched provider, rotating backend handle"
                    );
                    entry.session.provider = provider.to_string();
                    entry.session.backend_handle = new_backend_handle();
                }
                entry.refresh();
                debug!(session_id = %id, "Session refreshed");
                return entry.session.clone();
            }
            debug!(session_id = %id, "Session expired, starting fresh");
        }

        let session = Session::new(id.clone(), provider);
        entries.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_used: Instant::now(),
            },
        );
        debug!(session_id = %session.id, "Session created");
        session
    }

    /// Look up a live session without refreshing it
    pub fn get(&self, id: &str) -> Option<Session> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(id)
            .filter(|entry| !entry.is_expired(self.ttl))
            .map(|entry| entry.session.clone())
    }

    /// Refresh a live session; returns false if it is missing or expired
    pub fn touch(&self, id: &str) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get_mut(id) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                entry.refresh();
                true
            }
            _ => false,
        }
    }

    /// Remove expired entries, returning how many were removed
    pub fn evict_expired(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        before - entries.len()
    }

    /// Number of stored entries (expired ones included until evicted)
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodically evict expired entries until the runtime shuts down
    pub fn spawn_eviction_task(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        let period = self.ttl?.min(MAX_EVICTION_PERIOD);
        let registry = Arc::clone(self);

        Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                let evicted = registry.evict_expired();
                if evicted > 0 {
                    info!(evicted, remaining = registry.len(), "Evicted expired sessions");
                }
            }
        }))
    }
}

fn new_backend_handle() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}
