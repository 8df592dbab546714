/// Collaborator contracts consumed by the credential service
///
/// `store.backend` selects the Postgres or the in-memory implementations.
/// Both honour the same expiry and uniqueness rules.

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::principal::Principal;

pub use memory::{InMemoryTokenStateStore, InMemoryUserStore};
pub use postgres::{PgTokenStateStore, PgUserStore};

/// Durable principal records
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Persist a new principal. Fails with `StoreError::Duplicate` if the
    /// email is already taken.
    async fn create(&self, principal: &Principal) -> Result<(), StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Principal, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Principal, StoreError>;
}

/// Refresh-token identifier to owner bindings
///
/// A live record means "not revoked". Records expire
/// [`REFRESH_TOKEN_TTL_SECS`](crate::auth::REFRESH_TOKEN_TTL_SECS) after
/// being stored.
#[async_trait]
pub trait TokenStateStore: Send + Sync {
    /// Create or overwrite the binding for `token_id`
    async fn store(&self, token_id: &str, principal_id: &str) -> Result<(), StoreError>;

    /// True when no live record exists, including when the store cannot be read
    async fn is_revoked(&self, token_id: &str) -> bool;

    /// Delete the binding. Returns whether a live record was removed; the
    /// delete is atomic so at most one concurrent caller sees `true`.
    async fn revoke(&self, token_id: &str) -> Result<bool, StoreError>;

    /// Owner of a live binding, or `StoreError::NotFound`
    async fn resolve_principal(&self, token_id: &str) -> Result<String, StoreError>;

    /// Drop records past their expiry, returning how many were removed.
    /// Stores that expire records on their own keep the default.
    async fn purge_expired(&self) -> Result<u64, StoreError> {
        Ok(0)
    }
}
