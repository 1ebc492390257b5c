use actix_web::{cookie::Cookie, http::header, web, HttpResponse};

use super::ErrorResponse;
use crate::db::UserLookup;
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{
    AccessTokenResponse, LoginForm, Msg, RecoveryByEmailQuery, RecoveryByUsernameQuery,
    RefreshTokenQuery, TokenResetPassword, TokenResponse,
};
use crate::AppState;

pub const SESSION_COOKIE: &str = "bearer";

/// OAuth2 password grant
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "authentication",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token pair issued", body = TokenResponse),
        (status = 400, description = "Inactive user or session store failure", body = ErrorResponse),
        (status = 404, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    state: web::Data<AppState>,
    form: web::Form<LoginForm>,
) -> Result<HttpResponse> {
    let tokens = state.auth_service().login(form.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

/// New access token for a live session. The presented token may be expired.
#[utoipa::path(
    get,
    path = "/auth/refresh_token",
    tag = "authentication",
    params(RefreshTokenQuery),
    responses(
        (status = 201, description = "Access token issued", body = AccessTokenResponse),
        (status = 401, description = "Token issuer or audience mismatch", body = ErrorResponse),
        (status = 403, description = "Could not validate credentials", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    state: web::Data<AppState>,
    query: web::Query<RefreshTokenQuery>,
) -> Result<HttpResponse> {
    let token = state.auth_service().refresh(&query.token).await?;
    Ok(HttpResponse::Created().json(token))
}

#[utoipa::path(
    post,
    path = "/auth/password-recovery-by-email",
    tag = "authentication",
    params(RecoveryByEmailQuery),
    responses(
        (status = 200, description = "Recovery email sent", body = Msg),
        (status = 404, description = "No user with this email", body = ErrorResponse)
    )
)]
pub async fn recover_password_by_email(
    state: web::Data<AppState>,
    query: web::Query<RecoveryByEmailQuery>,
) -> Result<HttpResponse> {
    let msg = state
        .auth_service()
        .recover_password(UserLookup::ByEmail(&query.email))
        .await?;
    Ok(HttpResponse::Ok().json(msg))
}

#[utoipa::path(
    post,
    path = "/auth/password-recovery-by-username",
    tag = "authentication",
    params(RecoveryByUsernameQuery),
    responses(
        (status = 200, description = "Recovery email sent", body = Msg),
        (status = 404, description = "No user with this username", body = ErrorResponse)
    )
)]
pub async fn recover_password_by_username(
    state: web::Data<AppState>,
    query: web::Query<RecoveryByUsernameQuery>,
) -> Result<HttpResponse> {
    let msg = state
        .auth_service()
        .recover_password(UserLookup::ByUsername(&query.username))
        .await?;
    Ok(HttpResponse::Ok().json(msg))
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    tag = "authentication",
    request_body = TokenResetPassword,
    responses(
        (status = 200, description = "Password updated", body = Msg),
        (status = 400, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Password does not meet the policy", body = ErrorResponse)
    )
)]
pub async fn reset_password(
    state: web::Data<AppState>,
    payload: web::Json<TokenResetPassword>,
) -> Result<HttpResponse> {
    let msg = state
        .auth_service()
        .reset_password(payload.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(msg))
}

/// End the session and send the client back to the landing page
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "authentication",
    responses(
        (status = 302, description = "Session revoked, redirect to /"),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn logout(state: web::Data<AppState>, current: CurrentUser) -> Result<HttpResponse> {
    state.auth_service().logout(&current.claims).await?;
    Ok(logout_redirect())
}

pub(crate) fn logout_redirect() -> HttpResponse {
    let mut cookie = Cookie::build(SESSION_COOKIE, "").path("/").finish();
    cookie.make_removal();

    HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish()
}
