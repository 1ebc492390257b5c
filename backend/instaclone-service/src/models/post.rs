use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::error::Result;
use crate::validators;

pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct PostCreate {
    #[validate(url(message = "must be a valid URL"))]
    #[schema(example = "https://cdn.example.com/photos/sunset.jpg")]
    pub image_url: String,

    #[validate(length(min = 1, max = 2200, message = "must be between 1 and 2200 characters"))]
    #[schema(example = "Golden hour")]
    pub caption: String,
}

impl PostCreate {
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        validators::validate_http_url(&self.image_url)
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PostDisplay {
    pub id: Uuid,
    pub user_id: Uuid,
    pub image_url: String,
    pub caption: String,
    pub created_at: DateTime<Utc>,
}

impl From<Post> for PostDisplay {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            user_id: post.user_id,
            image_url: post.image_url,
            caption: post.caption,
            created_at: post.created_at,
        }
    }
}

/// Optional paging; without `limit` every post is returned
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListQuery {
    /// Page size, capped at 100
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PostListQuery {
    pub fn limit(&self) -> Option<i64> {
        self.limit.map(|l| l.clamp(1, MAX_PAGE_SIZE))
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}
