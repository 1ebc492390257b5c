//! # Actix Middleware Library
//!
//! Authentication middleware shared by Instaclone Actix services
//!
//! ## Modules
//! - `jwt_auth`: Bearer JWT authentication middleware and claims extractor
//! - `error`: JSON error responses for rejected requests

pub mod error;
pub mod jwt_auth;

pub use error::AuthError;
pub use jwt_auth::{AuthClaims, JwtAuthMiddleware};
