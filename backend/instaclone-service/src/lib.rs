//! Instaclone service
//!
//! REST backend for a photo-sharing app: user accounts, posts and
//! JWT sessions backed by PostgreSQL and Redis.

pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod security;
pub mod services;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

use redis_utils::SharedConnectionManager;
use services::{AuthService, EmailService, TokenStore};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared handles every request handler works from
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: SharedConnectionManager,
    pub config: Arc<Config>,
    pub email: EmailService,
}

impl AppState {
    pub fn new(db: PgPool, redis: SharedConnectionManager, config: Config, email: EmailService) -> Self {
        Self {
            db,
            redis,
            config: Arc::new(config),
            email,
        }
    }

    /// Refresh token store; entries live as long as the refresh token.
    pub fn token_store(&self) -> TokenStore {
        TokenStore::new(
            self.redis.clone(),
            self.config.jwt.refresh_token_ttl_secs(),
            self.config.redis.command_timeout(),
        )
    }

    pub fn auth_service(&self) -> AuthService {
        AuthService::new(
            self.db.clone(),
            self.token_store(),
            self.config.clone(),
            self.email.clone(),
        )
    }
}
