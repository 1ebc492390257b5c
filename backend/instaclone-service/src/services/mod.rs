/// Business logic layer
pub mod auth;
pub mod email;
pub mod posts;
pub mod token_store;
pub mod users;

pub use auth::AuthService;
pub use email::EmailService;
pub use posts::PostService;
pub use token_store::TokenStore;
pub use users::UserService;
