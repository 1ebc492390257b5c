use crypto_core::jwt::{self, Claims, TokenScope};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};

use super::{EmailService, TokenStore, UserService};
use crate::config::Config;
use crate::db::{users, UserLookup};
use crate::error::{AppError, Result, CREDENTIALS_ERROR};
use crate::models::{AccessTokenResponse, LoginForm, Msg, TokenResetPassword, TokenResponse};
use crate::security::{hash_password, tokens, verify_password};
use crate::validators;

const STORE_FAILED: &str = "Could not insert data in Authorization database";

pub struct AuthService {
    pool: PgPool,
    tokens: TokenStore,
    config: Arc<Config>,
    email: EmailService,
}

impl AuthService {
    pub fn new(pool: PgPool, tokens: TokenStore, config: Arc<Config>, email: EmailService) -> Self {
        Self {
            pool,
            tokens,
            config,
            email,
        }
    }

    /// Password grant: verify credentials, mint a token pair and remember
    /// the refresh token for the session.
    pub async fn login(&self, form: LoginForm) -> Result<TokenResponse> {
        let user = users::find_user(&self.pool, UserLookup::ByUsername(&form.username))
            .await?
            .ok_or_else(|| AppError::NotFound("Invalid credentials".to_string()))?;

        if !verify_password(&form.password, &user.password_hash)? {
            warn!(user_id = %user.id, "login rejected: incorrect password");
            return Err(AppError::NotFound("Incorrect password".to_string()));
        }
        if !user.is_active {
            return Err(AppError::BadRequest("Inactive user".to_string()));
        }

        let pair = tokens::issue_token_pair(&user, &self.config.jwt)?;
        let key = TokenStore::key(user.id, pair.jti);

        match self.tokens.store(&key, &pair.refresh_token).await {
            Ok(true) => {}
            Ok(false) => return Err(AppError::BadRequest(STORE_FAILED.to_string())),
            Err(e) => {
                warn!(user_id = %user.id, "refresh token store failed: {}", e);
                return Err(AppError::BadRequest(STORE_FAILED.to_string()));
            }
        }

        info!(user_id = %user.id, "user logged in");
        Ok(TokenResponse::bearer(pair.access_token, pair.refresh_token))
    }

    /// Exchange a session token (expired or not) for a new access token,
    /// provided the session's refresh token is still stored and valid.
    pub async fn refresh(&self, token: &str) -> Result<AccessTokenResponse> {
        let presented = jwt::decode_token_allow_expired::<Claims>(token)?.claims;
        let user_id = presented.user_id()?;
        let key = TokenStore::key(user_id, presented.jti);

        let stored = self
            .tokens
            .fetch(&key)
            .await?
            .ok_or_else(|| AppError::Forbidden(CREDENTIALS_ERROR.to_string()))?;
        let refresh_claims = jwt::validate_token::<Claims>(&stored)?.claims;

        if refresh_claims.jti != presented.jti
            || refresh_claims.scope != TokenScope::RefreshToken
            || refresh_claims.preferred_username.is_empty()
        {
            return Err(AppError::Forbidden(CREDENTIALS_ERROR.to_string()));
        }

        let access_token = tokens::mint_access_token(refresh_claims, &self.config.jwt)?;
        info!(user_id = %user_id, "access token refreshed");
        Ok(AccessTokenResponse { access_token })
    }

    /// Email a reset link to the account found by `lookup`.
    pub async fn recover_password(&self, lookup: UserLookup<'_>) -> Result<Msg> {
        let user = UserService::new(self.pool.clone())
            .find(lookup)
            .await?
            .ok_or_else(|| match lookup {
                UserLookup::ByEmail(email) => AppError::NotFound(format!(
                    "The user with this email {email} does not exist in the system."
                )),
                UserLookup::ByUsername(username) => AppError::NotFound(format!(
                    "The user with this username {username} does not exist in the system."
                )),
                UserLookup::ById(id) => {
                    AppError::NotFound(format!("User with ID {id} not found in the system."))
                }
            })?;

        let token = tokens::generate_password_reset_token(&user.email, &self.config.jwt)?;
        self.email
            .dispatch_reset_password_email(user.email, user.username, token);

        Ok(Msg::new("Password recovery email sent"))
    }

    pub async fn reset_password(&self, payload: TokenResetPassword) -> Result<Msg> {
        let email = tokens::verify_password_reset_token(&payload.token)
            .ok_or_else(|| AppError::BadRequest("Invalid token".to_string()))?;
        validators::validate_password(&payload.password)?;

        let password_hash = hash_password(&payload.password)?;
        let user = users::update_password(&self.pool, &email, &password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found in the system.".to_string()))?;

        info!(user_id = %user.id, "password reset");
        Ok(Msg::new("Password updated successfully"))
    }

    /// Forget the refresh token of the session the claims belong to.
    pub async fn logout(&self, claims: &Claims) -> Result<()> {
        let user_id = claims.user_id()?;
        let revoked = self
            .tokens
            .revoke(&TokenStore::key(user_id, claims.jti))
            .await?;

        info!(user_id = %user_id, revoked, "user logged out");
        Ok(())
    }
}
