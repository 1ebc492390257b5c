/// Database operations for users and posts
pub mod posts;
pub mod users;

pub use users::UserLookup;
