use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

use super::response::ApiResponse;

/// Application-wide Result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Main application error type
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Validation errors for business rules
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Gateway callback whose digest does not match the recomputed one
    #[error("Signature mismatch: {0}")]
    SignatureMismatch(String),

    /// Provider disabled, unknown, or missing its secret
    #[error("Gateway not configured: {0}")]
    GatewayNotConfigured(String),

    /// Edit/delete attempted on a settled bill or order
    #[error("Cannot modify settled {0}")]
    SettlementViolation(String),

    /// State machine edge that does not exist
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Conflicting concurrent or duplicate write
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payment gateway or collaborator I/O errors
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Database operation errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ApiResponse::<()>::failure(self.public_message()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::SignatureMismatch(_) => StatusCode::UNAUTHORIZED,
            AppError::GatewayNotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::SettlementViolation(_) => StatusCode::CONFLICT,
            AppError::InvalidTransition(_) => StatusCode::CONFLICT,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gateway(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn signature_mismatch(msg: impl Into<String>) -> Self {
        AppError::SignatureMismatch(msg.into())
    }

    pub fn gateway_not_configured(provider: impl Into<String>) -> Self {
        AppError::GatewayNotConfigured(provider.into())
    }

    pub fn settlement_violation(target: impl Into<String>) -> Self {
        AppError::SettlementViolation(target.into())
    }

    pub fn invalid_transition(msg: impl Into<String>) -> Self {
        AppError::InvalidTransition(msg.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::Gateway(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Message shown to API callers.
    ///
    /// Signature failures and server-side faults collapse to generic text so
    /// verification details and SQL errors never reach the client.
    pub fn public_message(&self) -> String {
        match self {
            AppError::SignatureMismatch(_) => "Payment verification failed".to_string(),
            AppError::Database(_) | AppError::Internal(_) | AppError::Configuration(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}
