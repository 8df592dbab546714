/// Error Handling Module
///
/// One closed error enumeration per layer:
/// 1. `StoreError` for the user store and token-state store collaborators
/// 2. `ConfigError` for startup configuration problems (fatal to process start)
/// 3. `AuthError` for every credential operation, switched on by kind
/// 4. HTTP response mapping for the actix transport

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

/// ============================================================================
/// 1. COLLABORATOR ERRORS
/// ============================================================================

/// Errors surfaced by `UserStore` and `TokenStateStore` implementations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("duplicate entry: {0}")]
    Duplicate(String),
    #[error("store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                // unique_violation
                Some("23505") => StoreError::Duplicate(db_err.message().to_string()),
                _ => StoreError::Backend(db_err.message().to_string()),
            },
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// ============================================================================
/// 2. CONFIGURATION ERRORS
/// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required config: {0}")]
    MissingRequired(String),
    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}

/// ============================================================================
/// 3. CREDENTIAL OPERATION ERRORS
/// ============================================================================

/// Error kinds returned by the credential service
///
/// Login deliberately collapses "no such account" and "wrong password" into
/// `InvalidCredentials`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("email already exists")]
    EmailExists,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("invalid token")]
    InvalidToken,
    #[error("token has been revoked")]
    TokenRevoked,
    #[error("user not found")]
    UserNotFound,
    #[error("operation cancelled: {0}")]
    Cancelled(String),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::EmailExists => "EMAIL_EXISTS",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::InvalidToken => "TOKEN_INVALID",
            AuthError::TokenRevoked => "TOKEN_REVOKED",
            AuthError::UserNotFound => "USER_NOT_FOUND",
            AuthError::Cancelled(_) => "SERVICE_UNAVAILABLE",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Message safe to return to the caller
    fn public_message(&self) -> String {
        match self {
            AuthError::Cancelled(_) => "Service temporarily unavailable".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self, request_id: &str) {
        match self {
            AuthError::Internal(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Internal error");
            }
            AuthError::Cancelled(msg) => {
                tracing::error!(request_id = request_id, error = %msg, "Operation cancelled");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!(request_id = request_id, "Invalid credentials attempt");
            }
            other => {
                tracing::warn!(request_id = request_id, error = %other, "Request rejected");
            }
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::Internal(err.to_string())
    }
}

/// ============================================================================
/// 4. HTTP RESPONSE MAPPING
/// ============================================================================

/// Error response structure for HTTP responses
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with server logs
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::InvalidCredentials | AuthError::InvalidToken | AuthError::TokenRevoked => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log(&request_id);

        let status = self.status_code();
        let body = ErrorResponse::new(
            request_id,
            self.public_message(),
            self.code().to_string(),
            status.as_u16(),
        );

        HttpResponse::build(status).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AuthError::EmailExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(AuthError::InvalidCredentials.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::TokenRevoked.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::UserNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            AuthError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AuthError::Cancelled("slow".to_string()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_details_are_not_public() {
        let err = AuthError::Internal("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.public_message(), "Internal server error");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_store_error_becomes_internal() {
        let err: AuthError = StoreError::Backend("down".to_string()).into();
        match err {
            AuthError::Internal(msg) => assert!(msg.contains("down")),
            other => panic!("Expected Internal error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert_eq!(err, StoreError::NotFound);
    }

    #[test]
    fn test_error_response_creation() {
        let response = ErrorResponse::new(
            "test-123".to_string(),
            "Test error".to_string(),
            "TEST_ERROR".to_string(),
            400,
        );

        assert_eq!(response.error_id, "test-123");
        assert_eq!(response.code, "TEST_ERROR");
        assert_eq!(response.status, 400);
    }
}
