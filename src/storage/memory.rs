// src/storage/memory.rs
use dashmap::DashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use crate::config::Config;

#[derive(Debug, Clone)]
pub struct AdminSession {
    pub created_at: u64,
}

/// In-memory admin sessions keyed by the cookie token.
pub struct SessionStore {
    sessions: DashMap<String, AdminSession>,
    ttl_secs: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl SessionStore {
    pub fn new(config: &Config) -> Self {
        Self::with_ttl(config.session_ttl_secs)
    }

    pub fn with_ttl(ttl_secs: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl_secs,
        }
    }

    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs
    }

    /// Creates a session and returns its token.
    pub fn create(&self) -> String {
        let token = uuid::Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), AdminSession { created_at: now_secs() });
        token
    }

    pub fn is_valid(&self, token: &str) -> bool {
        self.cleanup_expired();
        self.sessions.contains_key(token)
    }

    pub fn remove(&self, token: &str) {
        self.sessions.remove(token);
    }

    pub fn cleanup_expired(&self) {
        self.cleanup_expired_at(now_secs());
    }

    fn cleanup_expired_at(&self, now: u64) {
        self.sessions.retain(|_, session| {
            now.saturating_sub(session.created_at) < self.ttl_secs
        });
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
