/// JWT Token Generation and Validation
///
/// HS256-signed access and refresh tokens. The signing secret is handed to
/// [`TokenCodec::new`] once and never changes afterwards.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, RefreshClaims};
use crate::configuration::JwtSettings;
use crate::error::AuthError;
use crate::principal::Role;

pub const ACCESS_TOKEN_TTL_SECS: i64 = 15 * 60;
pub const REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Signs and verifies access and refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(config: &JwtSettings) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;

        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(REFRESH_TOKEN_TTL_SECS),
        }
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl.num_seconds()
    }

    /// Sign a new access token for a principal
    pub fn sign_access(&self, principal_id: &str, role: Role) -> Result<String, AuthError> {
        self.sign_access_at(principal_id, role, Utc::now())
    }

    fn sign_access_at(
        &self,
        principal_id: &str,
        role: Role,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AuthError> {
        let claims = AccessClaims {
            sub: principal_id.to_string(),
            role: role.as_str().to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: (issued_at + self.access_ttl).timestamp(),
        };
        self.sign(&claims)
    }

    /// Sign a new refresh token
    ///
    /// Returns the signed token and its identifier for the caller to bind.
    pub fn sign_refresh(&self) -> Result<(String, String), AuthError> {
        self.sign_refresh_at(Utc::now())
    }

    fn sign_refresh_at(&self, issued_at: DateTime<Utc>) -> Result<(String, String), AuthError> {
        let claims = RefreshClaims {
            jti: Uuid::new_v4().to_string(),
            exp: (issued_at + self.refresh_ttl).timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, claims.jti))
    }

    /// Verify signature, algorithm and expiry of an access token
    pub fn parse_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        self.verify(token)
    }

    /// Verify signature, algorithm and expiry of a refresh token
    pub fn parse_refresh(&self, token: &str) -> Result<RefreshClaims, AuthError> {
        self.verify(token)
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("Token generation failed: {}", e)))
    }

    fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, AuthError> {
        decode::<T>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                AuthError::InvalidToken
            })
    }
}
