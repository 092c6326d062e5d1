use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Application error taxonomy. Every variant maps to exactly one HTTP status
/// and a `{"error": "..."}` JSON body; internals behind 500s are logged at the
/// failure site and never leaked to the caller.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("No token provided")]
    NoToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    // Covers both absent and not-owned so callers cannot probe for other
    // users' resource ids.
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Invalid payment signature")]
    SignatureMismatch,

    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Upstream service error: {0}")]
    Upstream(String),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        ApiError::InvalidState(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        ApiError::Upstream(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ApiError::Validation(_))
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Database(_) | ApiError::Upstream(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::SignatureMismatch => StatusCode::BAD_REQUEST,
            ApiError::NoToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidToken => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(serde_json::json!({ "error": self.public_message() }))
    }
}
