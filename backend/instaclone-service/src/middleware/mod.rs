/// HTTP middleware and request guards
pub mod current_user;
pub mod permissions;

pub use actix_middleware::JwtAuthMiddleware;
pub use current_user::CurrentUser;
