/// Credential Service
///
/// Orchestrates registration, login, refresh-token rotation and logout on top
/// of the password hasher, the token codec and the two store collaborators.
///
/// Every collaborator call is bounded by the configured operation timeout;
/// elapsing surfaces as `AuthError::Cancelled`. Dropping a returned future
/// cancels the operation at its current await point.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::auth::jwt::TokenCodec;
use crate::auth::password::{hash_password, verify_password, DUMMY_HASH};
use crate::error::{AuthError, StoreError};
use crate::principal::{Principal, Role};
use crate::store::{TokenStateStore, UserStore};

/// A freshly minted access + refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

pub struct CredentialService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStateStore>,
    codec: TokenCodec,
    operation_timeout: Duration,
}

impl CredentialService {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStateStore>,
        codec: TokenCodec,
        operation_timeout: Duration,
    ) -> Self {
        Self {
            users,
            tokens,
            codec,
            operation_timeout,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Create a new principal
    ///
    /// # Errors
    /// - `EmailExists` if the email is already registered
    /// - `Internal` on hashing or storage failure
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<Principal, AuthError> {
        match self.bounded("find_by_email", self.users.find_by_email(email)).await? {
            Ok(_) => return Err(AuthError::EmailExists),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let password_hash = hash_blocking(password.to_string()).await?;

        let principal = Principal {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash,
            role,
            created_at: Utc::now(),
        };

        // The store enforces uniqueness; a concurrent registration that slipped
        // past the lookup above lands here.
        match self.bounded("create_user", self.users.create(&principal)).await? {
            Ok(()) => {}
            Err(StoreError::Duplicate(_)) => return Err(AuthError::EmailExists),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %principal.id, role = %principal.role, "User registered");
        Ok(principal)
    }

    /// Authenticate with email and password
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials` after
    /// the same amount of hashing work.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let principal = match self
            .bounded("find_by_email", self.users.find_by_email(email))
            .await?
        {
            Ok(principal) => Some(principal),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let encoded = principal
            .as_ref()
            .map(|p| p.password_hash.clone())
            .unwrap_or_else(|| DUMMY_HASH.to_string());
        let verified = verify_blocking(password.to_string(), encoded).await?;

        let principal = match principal {
            Some(principal) if verified => principal,
            _ => return Err(AuthError::InvalidCredentials),
        };

        let (pair, token_id) = self.mint(&principal)?;

        // Best effort: the caller still gets usable tokens if the binding
        // cannot be recorded.
        match self
            .bounded("store_binding", self.tokens.store(&token_id, &principal.id))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(
                    user_id = %principal.id,
                    error = %e,
                    "Failed to store refresh token binding at login"
                );
            }
            Err(e) => {
                tracing::warn!(
                    user_id = %principal.id,
                    error = %e,
                    "Storing refresh token binding at login did not complete"
                );
            }
        }

        tracing::info!(user_id = %principal.id, "User logged in");
        Ok(pair)
    }

    /// Exchange a refresh token for a new pair, revoking the presented one
    ///
    /// Order: check revoked, resolve owner, mint, revoke old, store new.
    /// Losing the race for the old binding to a concurrent refresh yields
    /// `TokenRevoked`. Failing to store the new binding fails the whole call.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        let claims = self.codec.parse_refresh(refresh_token)?;
        let old_id = claims.jti;

        if self.bounded("is_revoked", self.tokens.is_revoked(&old_id)).await? {
            tracing::warn!(token_id = %old_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked);
        }

        let principal_id = match self
            .bounded("resolve_principal", self.tokens.resolve_principal(&old_id))
            .await?
        {
            Ok(id) => id,
            Err(StoreError::NotFound) => return Err(AuthError::UserNotFound),
            Err(e) => return Err(e.into()),
        };

        let principal = match self
            .bounded("find_by_id", self.users.find_by_id(&principal_id))
            .await?
        {
            Ok(principal) => principal,
            Err(StoreError::NotFound) => {
                tracing::warn!(user_id = %principal_id, "Refresh token bound to missing user");
                return Err(AuthError::UserNotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let (pair, new_id) = self.mint(&principal)?;

        match self.bounded("revoke", self.tokens.revoke(&old_id)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => {
                tracing::warn!(
                    token_id = %old_id,
                    user_id = %principal.id,
                    "Refresh token consumed concurrently"
                );
                return Err(AuthError::TokenRevoked);
            }
            Ok(Err(e)) => {
                tracing::error!(
                    token_id = %old_id,
                    error = %e,
                    "Failed to revoke rotated refresh token"
                );
            }
            Err(e) => {
                tracing::error!(
                    token_id = %old_id,
                    error = %e,
                    "Revoking rotated refresh token did not complete"
                );
            }
        }

        self.bounded("store_binding", self.tokens.store(&new_id, &principal.id))
            .await?
            .map_err(|e| {
                tracing::error!(
                    user_id = %principal.id,
                    error = %e,
                    "Failed to store new refresh token binding"
                );
                AuthError::from(e)
            })?;

        tracing::info!(user_id = %principal.id, "Refresh token rotated");
        Ok(pair)
    }

    /// Revoke a refresh token. Revoking an already-revoked token succeeds.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        let claims = self.codec.parse_refresh(refresh_token)?;

        self.bounded("revoke", self.tokens.revoke(&claims.jti))
            .await??;

        tracing::info!(token_id = %claims.jti, "Refresh token revoked at logout");
        Ok(())
    }

    /// Look up the principal named by a validated access token
    pub async fn principal(&self, principal_id: &str) -> Result<Principal, AuthError> {
        match self.bounded("find_by_id", self.users.find_by_id(principal_id)).await? {
            Ok(principal) => Ok(principal),
            Err(StoreError::NotFound) => Err(AuthError::UserNotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn mint(&self, principal: &Principal) -> Result<(TokenPair, String), AuthError> {
        let access_token = self.codec.sign_access(&principal.id, principal.role)?;
        let (refresh_token, token_id) = self.codec.sign_refresh()?;

        Ok((
            TokenPair {
                access_token,
                refresh_token,
            },
            token_id,
        ))
    }

    async fn bounded<F, T>(&self, operation: &'static str, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = T>,
    {
        tokio::time::timeout(self.operation_timeout, fut)
            .await
            .map_err(|_| {
                AuthError::Cancelled(format!(
                    "{} exceeded {}ms",
                    operation,
                    self.operation_timeout.as_millis()
                ))
            })
    }
}

async fn hash_blocking(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("Hashing task failed: {}", e)))?
}

async fn verify_blocking(password: String, encoded: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(|e| AuthError::Internal(format!("Verification task failed: {}", e)))
}
