/// Authentication module
///
/// Password hashing, access/refresh token signing and validation, and the
/// credential service that ties them to the stores.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{AccessClaims, RefreshClaims};
pub use jwt::{TokenCodec, ACCESS_TOKEN_TTL_SECS, REFRESH_TOKEN_TTL_SECS};
pub use password::{hash_password, verify_password};
pub use service::{CredentialService, TokenPair};
