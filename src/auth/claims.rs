/// JWT Claims structures
///
/// Access tokens carry subject, role, a unique id and expiry. Refresh tokens
/// carry only a unique id and expiry; their owner is recorded server-side.

use serde::{Deserialize, Serialize};

/// Claims for short-lived access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (principal identifier)
    pub sub: String,
    pub role: String,
    /// Unique token identifier
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Claims for long-lived refresh tokens
///
/// Unknown fields are rejected so an access token cannot be presented where a
/// refresh token is expected.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RefreshClaims {
    pub jti: String,
    pub exp: i64,
}
