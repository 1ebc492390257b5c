use crate::error::Result;
use crate::models::{NewPost, Post};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn insert_post(pool: &PgPool, post: &NewPost) -> Result<Post> {
    let post = sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (id, user_id, image_url, caption)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(post.user_id)
    .bind(&post.image_url)
    .bind(&post.caption)
    .fetch_one(pool)
    .await?;

    Ok(post)
}

pub async fn find_post_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(post)
}

/// Newest first. A `None` limit binds SQL NULL, which Postgres reads as no limit.
pub async fn list_posts(pool: &PgPool, limit: Option<i64>, offset: i64) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn list_posts_by_user(
    pool: &PgPool,
    user_id: Uuid,
    limit: Option<i64>,
    offset: i64,
) -> Result<Vec<Post>> {
    let posts = sqlx::query_as::<_, Post>(
        r#"
        SELECT * FROM posts
        WHERE user_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(posts)
}

pub async fn delete_post(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM posts WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
