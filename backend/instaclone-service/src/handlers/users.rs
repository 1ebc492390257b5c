use actix_web::{web, HttpResponse};
use tracing::info;
use uuid::Uuid;

use super::{deleted_response, ErrorResponse};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{UserCreate, UserDisplay, UserMe, UserUpdate};
use crate::services::UserService;
use crate::AppState;

/// Create an account
#[utoipa::path(
    post,
    path = "/user/register-user",
    tag = "users",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserDisplay),
        (status = 400, description = "Username or email already taken", body = ErrorResponse),
        (status = 422, description = "Invalid payload", body = ErrorResponse)
    )
)]
pub async fn register_user(
    state: web::Data<AppState>,
    payload: web::Json<UserCreate>,
) -> Result<HttpResponse> {
    let user = UserService::new(state.db.clone())
        .register(payload.into_inner())
        .await?;

    if state.email.is_enabled() {
        state
            .email
            .dispatch_new_account_email(user.email.clone(), user.username.clone());
    }

    Ok(HttpResponse::Created().json(UserDisplay::from(user)))
}

/// Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/user/get-me",
    tag = "users",
    responses(
        (status = 200, description = "Current user", body = UserMe),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Could not validate credentials", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_me(current: CurrentUser) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserMe::from(current.user)))
}

#[utoipa::path(
    get,
    path = "/user/get-user/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserDisplay),
        (status = 404, description = "User not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    user_id: web::Path<Uuid>,
    state: web::Data<AppState>,
    _current: CurrentUser,
) -> Result<HttpResponse> {
    let user = UserService::new(state.db.clone())
        .get(user_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(UserDisplay::from(user)))
}

#[utoipa::path(
    get,
    path = "/user/get-all-users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserDisplay]),
        (status = 404, description = "No users", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_all_users(
    state: web::Data<AppState>,
    _current: CurrentUser,
) -> Result<HttpResponse> {
    let users: Vec<UserDisplay> = UserService::new(state.db.clone())
        .list()
        .await?
        .into_iter()
        .map(UserDisplay::from)
        .collect();

    Ok(HttpResponse::Ok().json(users))
}

/// Partial update of the caller's own account
#[utoipa::path(
    put,
    path = "/user/update-user/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "User updated", body = UserDisplay),
        (status = 400, description = "Username or email already taken", body = ErrorResponse),
        (status = 403, description = "Not the account owner", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 422, description = "Invalid payload", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    user_id: web::Path<Uuid>,
    payload: web::Json<UserUpdate>,
) -> Result<HttpResponse> {
    let user = UserService::new(state.db.clone())
        .update(&current.user, user_id.into_inner(), payload.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(UserDisplay::from(user)))
}

#[utoipa::path(
    delete,
    path = "/user/delete-user/{user_id}",
    tag = "users",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Delete outcome in the `deleted` and `deleted_at` headers"),
        (status = 403, description = "Not the account owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    state: web::Data<AppState>,
    current: CurrentUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let user_id = user_id.into_inner();
    let deleted = UserService::new(state.db.clone())
        .delete(&current.user, user_id)
        .await?;

    info!(user_id = %user_id, deleted, "delete user request handled");
    Ok(deleted_response(deleted))
}
