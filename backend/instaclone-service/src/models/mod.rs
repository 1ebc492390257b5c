pub mod gender;
pub mod msg;
pub mod post;
pub mod token;
pub mod user;

pub use gender::Gender;
pub use msg::Msg;
pub use post::{NewPost, Post, PostCreate, PostDisplay, PostListQuery};
pub use token::{
    AccessTokenResponse, LoginForm, RecoveryByEmailQuery, RecoveryByUsernameQuery,
    RefreshTokenQuery, TokenResetPassword, TokenResponse,
};
pub use user::{NewUser, User, UserChanges, UserCreate, UserDisplay, UserMe, UserUpdate};
