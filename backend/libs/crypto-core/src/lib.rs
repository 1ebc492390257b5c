//! Token primitives shared by the Instaclone services.
//!
//! `jwt` owns the process-wide HS256 keys and the claim set carried by
//! access and refresh tokens.

pub mod jwt;

pub use jwt::{Claims, JwtError, TokenScope};
