/// HTTP request handlers
pub mod auth;
pub mod health;
pub mod posts;
pub mod users;

use actix_web::{http::header, web, HttpResponse};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::middleware::JwtAuthMiddleware;
use crate::models::Msg;

/// Error body shared by every endpoint
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Unversioned routes: greeting and health probes.
pub fn configure_root(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(root))
        .route("/health", web::get().to(health::health))
        .route("/health/ready", web::get().to(health::readiness));
}

/// Versioned API, mounted under `API_V1_STR`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::FormConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .service(
        web::scope("/user")
            .route("/register-user", web::post().to(users::register_user))
            .service(
                web::resource("/get-me")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(users::get_me)),
            )
            .service(
                web::resource("/get-user/{user_id}")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(users::get_user)),
            )
            .service(
                web::resource("/get-all-users")
                    .wrap(JwtAuthMiddleware)
                    .route(web::get().to(users::get_all_users)),
            )
            .service(
                web::resource("/update-user/{user_id}")
                    .wrap(JwtAuthMiddleware)
                    .route(web::put().to(users::update_user)),
            )
            .service(
                web::resource("/delete-user/{user_id}")
                    .wrap(JwtAuthMiddleware)
                    .route(web::delete().to(users::delete_user)),
            ),
    )
    .service(
        web::scope("/posts")
            .wrap(JwtAuthMiddleware)
            .service(
                web::resource("")
                    .route(web::post().to(posts::create_post))
                    .route(web::get().to(posts::get_all_posts)),
            )
            .service(
                web::resource("/user/{user_id}").route(web::get().to(posts::get_user_posts)),
            )
            .service(
                web::resource("/{post_id}")
                    .route(web::get().to(posts::get_post))
                    .route(web::delete().to(posts::delete_post)),
            ),
    )
    .service(
        web::scope("/auth")
            .route("/login", web::post().to(auth::login))
            .route("/refresh_token", web::get().to(auth::refresh_token))
            .route(
                "/password-recovery-by-email",
                web::post().to(auth::recover_password_by_email),
            )
            .route(
                "/password-recovery-by-username",
                web::post().to(auth::recover_password_by_username),
            )
            .route("/reset-password", web::post().to(auth::reset_password))
            .service(
                web::resource("/logout")
                    .wrap(JwtAuthMiddleware)
                    .route(web::post().to(auth::logout)),
            ),
    );
}

pub async fn root() -> HttpResponse {
    HttpResponse::Ok().json(Msg::new("hello world!"))
}

/// 204 carrying the outcome of a delete in `deleted` / `deleted_at` headers.
pub(crate) fn deleted_response(deleted: bool) -> HttpResponse {
    HttpResponse::NoContent()
        .insert_header((
            header::HeaderName::from_static("deleted"),
            deleted.to_string(),
        ))
        .insert_header((
            header::HeaderName::from_static("deleted_at"),
            Utc::now().to_rfc3339(),
        ))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{body::to_bytes, http::StatusCode};

    #[actix_web::test]
    async fn root_says_hello() {
        let resp = root().await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = to_bytes(resp.into_body()).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["msg"], "hello world!");
    }

    #[test]
    fn delete_headers_are_set() {
        let resp = deleted_response(true);
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert_eq!(resp.headers().get("deleted").unwrap(), "true");

        let at = resp.headers().get("deleted_at").unwrap().to_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(at).is_ok());
    }
}
