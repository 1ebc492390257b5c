use actix_web::{
    error::ResponseError,
    http::{header, StatusCode},
    HttpResponse,
};
use crypto_core::JwtError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

pub const CREDENTIALS_ERROR: &str = "Could not validate credentials";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("User with {field} {value} already exists in the system.")]
    Duplicate { field: &'static str, value: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    #[error("Token error: {0}")]
    Token(String),

    #[error("Email error: {0}")]
    Email(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Redis(_)
                | AppError::Token(_)
                | AppError::Email(_)
                | AppError::Internal(_)
        )
    }

    /// Message exposed to clients; internal failures are not described.
    pub fn detail(&self) -> String {
        if self.is_internal() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Database(_)
            | AppError::Redis(_)
            | AppError::Token(_)
            | AppError::Email(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if self.is_internal() {
            tracing::error!(error = %self, "request failed");
        }

        let mut builder = HttpResponse::build(status);
        if matches!(self, AppError::Unauthorized(_) | AppError::Forbidden(_)) {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(serde_json::json!({ "detail": self.detail() }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Internal(format!("password hashing failed: {err}"))
    }
}

impl From<JwtError> for AppError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AppError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidClaims(_) => AppError::Unauthorized(
                "Authorization claim is incorrect, please check audience and issuer".to_string(),
            ),
            JwtError::Invalid(_) => AppError::Forbidden(CREDENTIALS_ERROR.to_string()),
            other => AppError::Token(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(format!("{err:#}"))
    }
}
