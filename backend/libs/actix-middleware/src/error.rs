use actix_web::{
    http::{header, StatusCode},
    HttpResponse, ResponseError,
};
use crypto_core::JwtError;

/// Rejections produced while authenticating a request.
///
/// Bodies use the `{"detail": ...}` shape of the service error responses.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Not authenticated")]
    MissingCredentials,

    #[error("Could not validate credentials")]
    InvalidCredentials,

    #[error("Token expired")]
    Expired,

    #[error("Authorization claim is incorrect, please check audience and issuer")]
    IncorrectClaims,

    #[error("Authentication is not configured")]
    NotConfigured,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            JwtError::InvalidClaims(_) => AuthError::IncorrectClaims,
            JwtError::Invalid(_) => AuthError::InvalidCredentials,
            JwtError::NotInitialized
            | JwtError::AlreadyInitialized
            | JwtError::WeakSecret(_)
            | JwtError::Encoding(_) => AuthError::NotConfigured,
        }
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingCredentials | AuthError::Expired | AuthError::IncorrectClaims => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::InvalidCredentials => StatusCode::FORBIDDEN,
            AuthError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if self.status_code() != StatusCode::INTERNAL_SERVER_ERROR {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(serde_json::json!({ "detail": self.to_string() }))
    }
}
