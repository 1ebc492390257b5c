use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::db::posts;
use crate::error::{AppError, Result};
use crate::middleware::permissions::check_post_ownership;
use crate::models::{NewPost, Post, PostCreate, PostListQuery};

const NO_POSTS: &str = "This user has no posts in the system.";

pub struct PostService {
    pool: PgPool,
}

impl PostService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, owner_id: Uuid, payload: PostCreate) -> Result<Post> {
        payload.check()?;

        let post = posts::insert_post(
            &self.pool,
            &NewPost {
                user_id: owner_id,
                image_url: payload.image_url,
                caption: payload.caption,
            },
        )
        .await?;

        info!(post_id = %post.id, user_id = %owner_id, "post created");
        Ok(post)
    }

    pub async fn get(&self, id: Uuid) -> Result<Post> {
        posts::find_post_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post with ID {id} not found in the system.")))
    }

    pub async fn list(&self, query: PostListQuery) -> Result<Vec<Post>> {
        let posts = posts::list_posts(&self.pool, query.limit(), query.offset()).await?;
        if posts.is_empty() {
            return Err(AppError::NotFound(NO_POSTS.to_string()));
        }
        Ok(posts)
    }

    pub async fn list_by_user(&self, user_id: Uuid, query: PostListQuery) -> Result<Vec<Post>> {
        let posts =
            posts::list_posts_by_user(&self.pool, user_id, query.limit(), query.offset()).await?;
        if posts.is_empty() {
            return Err(AppError::NotFound(NO_POSTS.to_string()));
        }
        Ok(posts)
    }

    /// Owner-only delete; a missing post is reported as `Ok(false)`.
    pub async fn delete(&self, actor_id: Uuid, id: Uuid) -> Result<bool> {
        let Some(post) = posts::find_post_by_id(&self.pool, id).await? else {
            return Ok(false);
        };
        check_post_ownership(actor_id, &post)?;

        let deleted = posts::delete_post(&self.pool, id).await?;
        if deleted {
            info!(post_id = %id, user_id = %actor_id, "post deleted");
        }
        Ok(deleted)
    }
}
