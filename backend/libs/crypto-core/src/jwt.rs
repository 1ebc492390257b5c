/// Shared JWT module for Instaclone services
///
/// Tokens are signed with HS256 using the service `SECRET_KEY`. Every token
/// carries the configured issuer and audience, and validation rejects tokens
/// minted for anything else.
///
/// ## Usage
///
/// Services must call `initialize_jwt_keys()` during startup before any JWT operations:
///
/// ```rust,no_run
/// use crypto_core::jwt;
///
/// let secret = std::env::var("SECRET_KEY").unwrap();
/// jwt::initialize_jwt_keys(
///     &secret,
///     "http://localhost:8000",
///     "http://localhost:8000/authentication/login",
/// )
/// .unwrap();
/// ```
use chrono::{DateTime, Duration, NaiveDate, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, TokenData,
    Validation,
};
use once_cell::sync::OnceCell;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum accepted secret length in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// Prefix of the `sub` claim; the remainder is the user id
pub const SUBJECT_PREFIX: &str = "username:";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
    WeakSecret(usize),

    #[error("JWT keys already initialized")]
    AlreadyInitialized,

    #[error("JWT keys not initialized. Call initialize_jwt_keys() during startup.")]
    NotInitialized,

    #[error("Token expired")]
    Expired,

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("Invalid token: {0}")]
    Invalid(String),

    #[error("Failed to sign token: {0}")]
    Encoding(String),
}

impl From<jsonwebtoken::errors::Error> for JwtError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::ImmatureSignature
            | ErrorKind::MissingRequiredClaim(_) => JwtError::InvalidClaims(err.to_string()),
            _ => JwtError::Invalid(err.to_string()),
        }
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// What a token may be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenScope {
    AccessToken,
    RefreshToken,
}

/// Registered claims plus the OpenID-style profile claims of the user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    /// `username:{user_id}`
    pub sub: String,
    pub aud: String,
    pub exp: i64,
    pub nbf: i64,
    pub iat: i64,
    /// Shared by the access/refresh pair of one login
    pub jti: Uuid,
    pub scope: TokenScope,

    pub email: String,
    pub name: String,
    pub nickname: String,
    pub preferred_username: String,
    pub given_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    pub family_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthdate: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Claims {
    pub fn subject_for(user_id: Uuid) -> String {
        format!("{SUBJECT_PREFIX}{user_id}")
    }

    /// User id encoded in `sub`
    pub fn user_id(&self) -> Result<Uuid, JwtError> {
        let raw = self
            .sub
            .strip_prefix(SUBJECT_PREFIX)
            .ok_or_else(|| JwtError::Invalid("subject has no user prefix".to_string()))?;
        Uuid::parse_str(raw).map_err(|e| JwtError::Invalid(format!("malformed user id: {e}")))
    }

    /// Re-stamp the time claims for a fresh token of the given scope.
    /// `nbf` is backdated one second so the token is usable immediately.
    pub fn restamp(mut self, scope: TokenScope, lifetime: Duration) -> Self {
        let now = Utc::now();
        self.scope = scope;
        self.iat = now.timestamp();
        self.nbf = now.timestamp() - 1;
        self.exp = (now + lifetime).timestamp();
        self
    }
}

// ============================================================================
// Key Storage
// ============================================================================

struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
}

static JWT_KEYS: OnceCell<JwtKeys> = OnceCell::new();

// ============================================================================
// Initialization
// ============================================================================

/// Initialize the process-wide signing keys, issuer and audience.
///
/// Can only be called once. Subsequent calls return `AlreadyInitialized`.
pub fn initialize_jwt_keys(secret: &str, issuer: &str, audience: &str) -> Result<(), JwtError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(JwtError::WeakSecret(secret.len()));
    }

    let keys = JwtKeys {
        encoding: EncodingKey::from_secret(secret.as_bytes()),
        decoding: DecodingKey::from_secret(secret.as_bytes()),
        issuer: issuer.to_string(),
        audience: audience.to_string(),
    };

    JWT_KEYS
        .set(keys)
        .map_err(|_| JwtError::AlreadyInitialized)?;

    tracing::info!(issuer = %issuer, "JWT keys initialized");
    Ok(())
}

fn keys() -> Result<&'static JwtKeys, JwtError> {
    JWT_KEYS.get().ok_or(JwtError::NotInitialized)
}

pub fn issuer() -> Result<&'static str, JwtError> {
    keys().map(|k| k.issuer.as_str())
}

pub fn audience() -> Result<&'static str, JwtError> {
    keys().map(|k| k.audience.as_str())
}

// ============================================================================
// Encoding / Validation
// ============================================================================

pub fn encode_token<T: Serialize>(claims: &T) -> Result<String, JwtError> {
    let keys = keys()?;
    encode(&Header::new(JWT_ALGORITHM), claims, &keys.encoding)
        .map_err(|e| JwtError::Encoding(e.to_string()))
}

fn validation(keys: &JwtKeys, check_exp: bool) -> Validation {
    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = check_exp;
    validation.validate_nbf = true;
    validation.set_issuer(&[keys.issuer.as_str()]);
    validation.set_audience(&[keys.audience.as_str()]);
    validation
}

/// Full validation: signature, `exp`, `nbf`, `iss` and `aud`
pub fn validate_token<T: DeserializeOwned>(token: &str) -> Result<TokenData<T>, JwtError> {
    let keys = keys()?;
    Ok(decode::<T>(token, &keys.decoding, &validation(keys, true))?)
}

/// Same as `validate_token` but accepts tokens past their `exp`.
/// Used where an expired access token still identifies a session.
pub fn decode_token_allow_expired<T: DeserializeOwned>(
    token: &str,
) -> Result<TokenData<T>, JwtError> {
    let keys = keys()?;
    Ok(decode::<T>(token, &keys.decoding, &validation(keys, false))?)
}

// ============================================================================
// Tests
// ============================================================================
