/// Authentication Routes
///
/// Thin HTTP mapping over [`CredentialService`]: register, login, refresh,
/// logout and the current principal.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AccessClaims, CredentialService, TokenPair};
use crate::error::AuthError;
use crate::principal::Role;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Body for both refresh and logout
#[derive(Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl AuthResponse {
    fn new(pair: TokenPair, service: &CredentialService) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: service.codec().access_ttl_secs(),
        }
    }
}

/// POST /auth/register
///
/// # Errors
/// - 400: unknown role or empty email
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AuthError> {
    let role: Role = form.role.parse()?;
    if form.email.trim().is_empty() {
        return Err(AuthError::Validation("email is empty".to_string()));
    }

    let principal = service.register(&form.email, &form.password, role).await?;

    Ok(HttpResponse::Created().json(principal.view()))
}

/// POST /auth/login
///
/// Same 401 for unknown email and wrong password.
pub async fn login(
    form: web::Json<LoginRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AuthError> {
    let pair = service.login(&form.email, &form.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(pair, &service)))
}

/// POST /auth/refresh
///
/// Rotates the refresh token: the presented token is revoked and a new pair
/// is returned.
pub async fn refresh(
    form: web::Json<RefreshRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AuthError> {
    let pair = service.refresh_token(&form.refresh_token).await?;

    Ok(HttpResponse::Ok().json(AuthResponse::new(pair, &service)))
}

/// POST /auth/logout
pub async fn logout(
    form: web::Json<RefreshRequest>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AuthError> {
    service.logout(&form.refresh_token).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me
///
/// Requires `Authorization: Bearer <access_token>`; claims are injected by
/// the JWT middleware.
pub async fn get_current_user(
    claims: web::ReqData<AccessClaims>,
    service: web::Data<CredentialService>,
) -> Result<HttpResponse, AuthError> {
    let principal = service.principal(&claims.sub).await?;

    Ok(HttpResponse::Ok().json(principal.view()))
}
