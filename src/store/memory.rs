/// In-memory store implementations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;

use super::{TokenStateStore, UserStore};
use crate::auth::REFRESH_TOKEN_TTL_SECS;
use crate::error::StoreError;
use crate::principal::Principal;

/// Principals keyed by id with an email index
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    inner: Arc<RwLock<Users>>,
}

#[derive(Default)]
struct Users {
    by_id: HashMap<String, Principal>,
    id_by_email: HashMap<String, String>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, principal: &Principal) -> Result<(), StoreError> {
        let mut users = self.inner.write().await;

        if users.id_by_email.contains_key(&principal.email) {
            return Err(StoreError::Duplicate(format!("email {}", principal.email)));
        }
        if users.by_id.contains_key(&principal.id) {
            return Err(StoreError::Duplicate(format!("id {}", principal.id)));
        }

        users
            .id_by_email
            .insert(principal.email.clone(), principal.id.clone());
        users.by_id.insert(principal.id.clone(), principal.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Principal, StoreError> {
        let users = self.inner.read().await;
        users
            .id_by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: &str) -> Result<Principal, StoreError> {
        let users = self.inner.read().await;
        users.by_id.get(id).cloned().ok_or(StoreError::NotFound)
    }
}

struct Binding {
    principal_id: String,
    expires_at: DateTime<Utc>,
}

impl Binding {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Refresh-token bindings with lazy expiry
#[derive(Clone)]
pub struct InMemoryTokenStateStore {
    bindings: Arc<RwLock<HashMap<String, Binding>>>,
    ttl: Duration,
}

impl Default for InMemoryTokenStateStore {
    fn default() -> Self {
        Self::with_ttl(Duration::seconds(REFRESH_TOKEN_TTL_SECS))
    }
}

impl InMemoryTokenStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with a custom record lifetime
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            bindings: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Number of live bindings
    pub async fn live_count(&self) -> usize {
        let now = Utc::now();
        self.bindings
            .read()
            .await
            .values()
            .filter(|b| b.is_live(now))
            .count()
    }
}

#[async_trait]
impl TokenStateStore for InMemoryTokenStateStore {
    async fn store(&self, token_id: &str, principal_id: &str) -> Result<(), StoreError> {
        let binding = Binding {
            principal_id: principal_id.to_string(),
            expires_at: Utc::now() + self.ttl,
        };
        self.bindings
            .write()
            .await
            .insert(token_id.to_string(), binding);
        Ok(())
    }

    async fn is_revoked(&self, token_id: &str) -> bool {
        let now = Utc::now();
        !self
            .bindings
            .read()
            .await
            .get(token_id)
            .map(|b| b.is_live(now))
            .unwrap_or(false)
    }

    async fn revoke(&self, token_id: &str) -> Result<bool, StoreError> {
        let now = Utc::now();
        let removed = self.bindings.write().await.remove(token_id);
        Ok(removed.map(|b| b.is_live(now)).unwrap_or(false))
    }

    async fn resolve_principal(&self, token_id: &str) -> Result<String, StoreError> {
        let now = Utc::now();
        self.bindings
            .read()
            .await
            .get(token_id)
            .filter(|b| b.is_live(now))
            .map(|b| b.principal_id.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn purge_expired(&self) -> Result<u64, StoreError> {
        let now = Utc::now();
        let mut bindings = self.bindings.write().await;
        let before = bindings.len();
        bindings.retain(|_, b| b.is_live(now));
        Ok((before - bindings.len()) as u64)
    }
}
