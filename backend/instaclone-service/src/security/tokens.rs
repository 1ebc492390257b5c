//! Session and password-reset token issuance.

use chrono::{Duration, Utc};
use crypto_core::jwt::{self, Claims, TokenScope};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::error::Result;
use crate::models::User;

const PASSWORD_RESET_PURPOSE: &str = "password_reset";

/// Access/refresh pair minted at login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub jti: Uuid,
}

/// Claims for `user` with the given scope, lifetime and session id.
pub fn user_claims(user: &User, jti: Uuid, scope: TokenScope, lifetime: Duration) -> Result<Claims> {
    let now = Utc::now();

    Ok(Claims {
        iss: jwt::issuer()?.to_string(),
        sub: Claims::subject_for(user.id),
        aud: jwt::audience()?.to_string(),
        exp: (now + lifetime).timestamp(),
        nbf: now.timestamp() - 1,
        iat: now.timestamp(),
        jti,
        scope,
        email: user.email.clone(),
        name: user.full_name(),
        nickname: user.given_name.clone(),
        preferred_username: user.username.clone(),
        given_name: user.given_name.clone(),
        middle_name: user.middle_name.clone(),
        family_name: user.family_name.clone(),
        gender: user.gender.map(|g| g.to_string()),
        birthdate: user.birthdate,
        phone_number: user.phone_number.clone(),
        address: user.address.clone(),
        updated_at: user.updated_at,
    })
}

pub fn issue_token_pair(user: &User, config: &JwtConfig) -> Result<TokenPair> {
    let jti = Uuid::new_v4();

    let access = user_claims(
        user,
        jti,
        TokenScope::AccessToken,
        config.access_token_lifetime(),
    )?;
    let refresh = user_claims(
        user,
        jti,
        TokenScope::RefreshToken,
        config.refresh_token_lifetime(),
    )?;

    Ok(TokenPair {
        access_token: jwt::encode_token(&access)?,
        refresh_token: jwt::encode_token(&refresh)?,
        jti,
    })
}

/// New access token carrying the profile claims of a stored refresh token.
pub fn mint_access_token(refresh_claims: Claims, config: &JwtConfig) -> Result<String> {
    let claims = refresh_claims.restamp(TokenScope::AccessToken, config.access_token_lifetime());
    Ok(jwt::encode_token(&claims)?)
}

#[derive(Debug, Serialize, Deserialize)]
struct PasswordResetClaims {
    iss: String,
    aud: String,
    /// Account email
    sub: String,
    exp: i64,
    nbf: i64,
    iat: i64,
    jti: Uuid,
    purpose: String,
}

pub fn generate_password_reset_token(email: &str, config: &JwtConfig) -> Result<String> {
    let now = Utc::now();
    let claims = PasswordResetClaims {
        iss: jwt::issuer()?.to_string(),
        aud: jwt::audience()?.to_string(),
        sub: email.to_string(),
        exp: (now + config.reset_token_lifetime()).timestamp(),
        nbf: now.timestamp() - 1,
        iat: now.timestamp(),
        jti: Uuid::new_v4(),
        purpose: PASSWORD_RESET_PURPOSE.to_string(),
    };

    Ok(jwt::encode_token(&claims)?)
}

/// Email the reset token was issued for, or `None` if it is not a valid
/// unexpired reset token.
pub fn verify_password_reset_token(token: &str) -> Option<String> {
    match jwt::validate_token::<PasswordResetClaims>(token) {
        Ok(data) if data.claims.purpose == PASSWORD_RESET_PURPOSE => Some(data.claims.sub),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("password reset token rejected: {}", e);
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::user::tests::sample_user;

    pub(crate) const TEST_SECRET: &str = "service-test-secret-0123456789abcdef";

    /// Keys shared by every test in this crate's unit test binary.
    pub(crate) fn init_test_keys() {
        static INIT: std::sync::Once = std::sync::Once::new();
        INIT.call_once(|| {
            jwt::initialize_jwt_keys(
                TEST_SECRET,
                "http://localhost:8000",
                "http://localhost:8000/authentication/login",
            )
            .expect("Failed to initialize test keys");
        });
    }

    #[test]
    fn pair_shares_jti_and_has_scopes() {
        init_test_keys();
        let user = sample_user();
        let pair = issue_token_pair(&user, &JwtConfig::default()).unwrap();

        let access = jwt::validate_token::<Claims>(&pair.access_token).unwrap().claims;
        let refresh = jwt::validate_token::<Claims>(&pair.refresh_token).unwrap().claims;

        assert_eq!(access.jti, pair.jti);
        assert_eq!(refresh.jti, pair.jti);
        assert_eq!(access.scope, TokenScope::AccessToken);
        assert_eq!(refresh.scope, TokenScope::RefreshToken);
        assert_eq!(access.sub, format!("username:{}", user.id));
        assert_eq!(access.preferred_username, "jdoe");
        assert_eq!(access.name, "John Quincy Doe");
        assert_eq!(access.nickname, "John");
        assert_eq!(access.gender.as_deref(), Some("male"));
    }

    #[test]
    fn access_expiry_is_minutes() {
        init_test_keys();
        let config = JwtConfig {
            access_token_expire_minutes: 15,
            ..JwtConfig::default()
        };
        let pair = issue_token_pair(&sample_user(), &config).unwrap();
        let access = jwt::validate_token::<Claims>(&pair.access_token).unwrap().claims;

        assert_eq!(access.exp - access.iat, 15 * 60);
        assert_eq!(access.nbf, access.iat - 1);
    }

    #[test]
    fn minted_access_token_keeps_profile() {
        init_test_keys();
        let user = sample_user();
        let pair = issue_token_pair(&user, &JwtConfig::default()).unwrap();
        let refresh = jwt::validate_token::<Claims>(&pair.refresh_token).unwrap().claims;

        let token = mint_access_token(refresh, &JwtConfig::default()).unwrap();
        let claims = jwt::validate_token::<Claims>(&token).unwrap().claims;

        assert_eq!(claims.scope, TokenScope::AccessToken);
        assert_eq!(claims.jti, pair.jti);
        assert_eq!(claims.email, user.email);
    }

    #[test]
    fn reset_token_round_trip() {
        init_test_keys();
        let token =
            generate_password_reset_token("jdoe@example.com", &JwtConfig::default()).unwrap();
        assert_eq!(
            verify_password_reset_token(&token).as_deref(),
            Some("jdoe@example.com")
        );
    }

    #[test]
    fn session_tokens_are_not_reset_tokens() {
        init_test_keys();
        let pair = issue_token_pair(&sample_user(), &JwtConfig::default()).unwrap();
        assert_eq!(verify_password_reset_token(&pair.access_token), None);
        assert_eq!(verify_password_reset_token("garbage"), None);
    }
}
