use crate::models::Like;
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Insert a like; returns `None` when the (story, user) pair already exists
pub async fn create_like(
    pool: &PgPool,
    story_id: Uuid,
    user_id: Uuid,
) -> Result<Option<Like>, sqlx::Error> {
    sqlx::query_as::<_, Like>(
        r#"
        INSERT INTO likes (id, story_id, user_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (story_id, user_id) DO NOTHING
        RETURNING id, story_id, user_id, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(story_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Idempotent delete; returns true if a row was removed
pub async fn delete_like(pool: &PgPool, story_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query("DELETE FROM likes WHERE story_id = $1 AND user_id = $2")
        .bind(story_id)
        .bind(user_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}

pub async fn count_likes(pool: &PgPool, story_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM likes WHERE story_id = $1")
        .bind(story_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

pub async fn user_liked(pool: &PgPool, story_id: Uuid, user_id: Uuid) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 AS one FROM likes WHERE story_id = $1 AND user_id = $2")
        .bind(story_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}
