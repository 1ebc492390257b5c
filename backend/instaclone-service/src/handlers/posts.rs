use actix_web::{web, HttpResponse};
use uuid::Uuid;

use super::{deleted_response, ErrorResponse};
use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{Post, PostCreate, PostDisplay, PostListQuery};
use crate::services::PostService;
use crate::AppState;

fn display_all(posts: Vec<Post>) -> Vec<PostDisplay> {
    posts.into_iter().map(PostDisplay::from).collect()
}

/// Publish a post owned by the caller
#[utoipa::path(
    post,
    path = "/posts",
    tag = "posts",
    request_body = PostCreate,
    responses(
        (status = 201, description = "Post created", body = PostDisplay),
        (status = 422, description = "Invalid payload", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_post(
    state: web::Data<AppState>,
    current: CurrentUser,
    payload: web::Json<PostCreate>,
) -> Result<HttpResponse> {
    let post = PostService::new(state.db.clone())
        .create(current.user.id, payload.into_inner())
        .await?;

    Ok(HttpResponse::Created().json(PostDisplay::from(post)))
}

#[utoipa::path(
    get,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post found", body = PostDisplay),
        (status = 404, description = "Post not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_post(
    state: web::Data<AppState>,
    _current: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let post = PostService::new(state.db.clone())
        .get(post_id.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(PostDisplay::from(post)))
}

/// Newest posts first
#[utoipa::path(
    get,
    path = "/posts",
    tag = "posts",
    params(PostListQuery),
    responses(
        (status = 200, description = "Posts", body = [PostDisplay]),
        (status = 404, description = "No posts", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_all_posts(
    state: web::Data<AppState>,
    _current: CurrentUser,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let posts = PostService::new(state.db.clone())
        .list(query.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(display_all(posts)))
}

#[utoipa::path(
    get,
    path = "/posts/user/{user_id}",
    tag = "posts",
    params(
        ("user_id" = Uuid, Path, description = "Owner ID"),
        PostListQuery
    ),
    responses(
        (status = 200, description = "Posts of the user", body = [PostDisplay]),
        (status = 404, description = "No posts", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user_posts(
    state: web::Data<AppState>,
    _current: CurrentUser,
    user_id: web::Path<Uuid>,
    query: web::Query<PostListQuery>,
) -> Result<HttpResponse> {
    let posts = PostService::new(state.db.clone())
        .list_by_user(user_id.into_inner(), query.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(display_all(posts)))
}

#[utoipa::path(
    delete,
    path = "/posts/{post_id}",
    tag = "posts",
    params(("post_id" = Uuid, Path, description = "Post ID")),
    responses(
        (status = 204, description = "Delete outcome in the `deleted` and `deleted_at` headers"),
        (status = 403, description = "Not the post owner", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_post(
    state: web::Data<AppState>,
    current: CurrentUser,
    post_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let deleted = PostService::new(state.db.clone())
        .delete(current.user.id, post_id.into_inner())
        .await?;

    Ok(deleted_response(deleted))
}
