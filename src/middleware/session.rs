//! TTL-based session cache for bearer-token lookups. Injected through
//! `AppState` rather than living in a process-wide global; entries expire
//! after the configured TTL and are evicted lazily on access.

use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::sync::RwLock;

use crate::middleware::auth::AuthUser;

#[derive(Clone)]
struct SessionEntry {
    user: AuthUser,
    expires_at: Instant,
}

#[derive(Clone)]
pub struct SessionStore {
    entries: Arc<RwLock<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Cached user for this token, if present and not expired.
    pub async fn get(&self, token: &str) -> Option<AuthUser> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(token) {
                Some(entry) if entry.expires_at > now => return Some(entry.user.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        // Expired: drop the stale entry.
        self.entries.write().await.remove(token);
        None
    }

    pub async fn insert(&self, token: String, user: AuthUser) {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        // Keep the map bounded; evict everything stale once it grows.
        if entries.len() > 10_000 {
            entries.retain(|_, entry| entry.expires_at > now);
        }
        entries.insert(
            token,
            SessionEntry {
                user,
                expires_at: now + self.ttl,
            },
        );
    }

}
