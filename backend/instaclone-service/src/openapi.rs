use std::path::Path;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::{OpenApi as OpenApiDoc, Server};
use utoipa::OpenApi;

use crate::config::Config;
use crate::handlers::{self, health, ErrorResponse};
use crate::models::{
    AccessTokenResponse, Gender, LoginForm, Msg, PostCreate, PostDisplay, TokenResetPassword,
    TokenResponse, UserCreate, UserDisplay, UserMe, UserUpdate,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Instaclone API",
        description = "Photo sharing backend: user accounts, posts and JWT sessions.",
        contact(name = "Instaclone Team", email = "support@instaclone.dev"),
        license(name = "Apache-2.0", url = "https://www.apache.org/licenses/LICENSE-2.0")
    ),
    paths(
        handlers::users::register_user,
        handlers::users::get_me,
        handlers::users::get_user,
        handlers::users::get_all_users,
        handlers::users::update_user,
        handlers::users::delete_user,
        handlers::posts::create_post,
        handlers::posts::get_post,
        handlers::posts::get_all_posts,
        handlers::posts::get_user_posts,
        handlers::posts::delete_post,
        handlers::auth::login,
        handlers::auth::refresh_token,
        handlers::auth::recover_password_by_email,
        handlers::auth::recover_password_by_username,
        handlers::auth::reset_password,
        handlers::auth::logout,
        handlers::health::health,
        handlers::health::readiness,
    ),
    components(schemas(
        Gender,
        UserCreate,
        UserUpdate,
        UserDisplay,
        UserMe,
        PostCreate,
        PostDisplay,
        LoginForm,
        TokenResponse,
        AccessTokenResponse,
        TokenResetPassword,
        Msg,
        ErrorResponse,
        health::HealthResponse,
        health::ComponentCheck,
        health::ReadinessResponse,
    )),
    tags(
        (name = "users", description = "Account registration and management"),
        (name = "posts", description = "Photo posts"),
        (name = "authentication", description = "Login, token refresh and password recovery"),
        (name = "health", description = "Service health checks"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut OpenApiDoc) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Access token from /auth/login"))
                        .build(),
                ),
            )
        }
    }
}

/// Document for this deployment: project title, crate version, and the
/// versioned prefix as the server base.
pub fn api_doc(config: &Config) -> OpenApiDoc {
    let mut doc = ApiDoc::openapi();
    doc.info.title = config.app.project_name.clone();
    doc.info.version = env!("CARGO_PKG_VERSION").to_string();
    doc.servers = Some(vec![Server::new(config.app.api_v1_str.clone())]);
    doc
}

/// Pretty JSON export consumed by the frontend client generator.
pub fn write_openapi_file(path: impl AsRef<Path>, doc: &OpenApiDoc) -> anyhow::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let json = doc.to_pretty_json()?;
    std::fs::write(path, json)?;
    tracing::info!(path = %path.display(), "OpenAPI document written");
    Ok(())
}
