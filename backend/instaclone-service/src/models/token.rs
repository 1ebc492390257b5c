use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// OAuth2 password grant form
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub grant_type: Option<String>,
    #[serde(default)]
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: String,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            refresh_token,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RefreshTokenQuery {
    /// Access or refresh token of the session; may be expired
    pub token: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecoveryByEmailQuery {
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecoveryByUsernameQuery {
    pub username: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct TokenResetPassword {
    pub token: String,
    pub password: String,
}
