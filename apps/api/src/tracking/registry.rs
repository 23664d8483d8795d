#![allow(dead_code)]

//! Session registry — the set of live sessions, keyed by id.
//!
//! Each session carries its own `tokio::sync::Mutex`, so concurrent frames for
//! the same session serialize (the accrual invariant requires it) while traffic
//! across different sessions proceeds fully in parallel. The outer map is only
//! locked for create/lookup/evict, never across a classifier call.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::errors::AppError;
use crate::tracking::session::SessionTracker;

pub type SharedSession = Arc<Mutex<SessionTracker>>;

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    /// Idle TTL. `None` retains sessions forever, matching the reference
    /// behavior; set `SESSION_TTL_SECS` to enable the sweeper.
    ttl: Option<Duration>,
}

impl SessionRegistry {
    pub fn new(ttl_secs: Option<u64>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: ttl_secs.map(|s| Duration::seconds(s as i64)),
        }
    }

    /// Allocates a fresh session id and inserts a zero-initialized tracker.
    pub async fn create(&self) -> Uuid {
        let id = Uuid::new_v4();
        let tracker = SessionTracker::new(id, Utc::now());
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(tracker)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Result<SharedSession, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Removes sessions idle longer than the configured TTL. No-op when no TTL
    /// is set. Returns the number of evicted sessions.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };

        let mut stale = Vec::new();
        {
            let sessions = self.sessions.read().await;
            for (id, session) in sessions.iter() {
                let tracker = session.lock().await;
                if now - tracker.last_transition() > ttl {
                    stale.push(*id);
                }
            }
        }

        if stale.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut evicted = 0;
        for id in &stale {
            if sessions.remove(id).is_some() {
                tracing::info!("Evicted idle session {id}");
                evicted += 1;
            }
        }
        evicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_then_get() {
        let registry = SessionRegistry::new(None);
        let id = registry.create().await;
        let session = registry.get(id).await.unwrap();
        assert_eq!(session.lock().await.id(), id);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_unknown_is_not_found() {
        let registry = SessionRegistry::new(None);
        let err = registry.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let registry = SessionRegistry::new(None);
        let a = registry.create().await;
        let b = registry.create().await;
        assert_ne!(a, b);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn test_eviction_disabled_without_ttl() {
        let registry = SessionRegistry::new(None);
        registry.create().await;
        let far_future = Utc::now() + Duration::days(365);
        assert_eq!(registry.evict_idle(far_future).await, 0);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_eviction_removes_only_idle_sessions() {
        let registry = SessionRegistry::new(Some(60));
        let stale = registry.create().await;
        let fresh = registry.create().await;

        // Touch the fresh session two minutes from now, then sweep shortly after.
        let later = Utc::now() + Duration::seconds(120);
        {
            let session = registry.get(fresh).await.unwrap();
            session.lock().await.flush(later);
        }

        let evicted = registry.evict_idle(later + Duration::seconds(1)).await;
        assert_eq!(evicted, 1);
        assert!(registry.get(stale).await.is_err());
        assert!(registry.get(fresh).await.is_ok());
    }
}
