use crate::models::Media;
use sqlx::PgPool;
use uuid::Uuid;

const MEDIA_COLUMNS: &str = "id, story_id, kind, url, position, metadata, created_at, updated_at";

pub async fn attach_media(
    pool: &PgPool,
    story_id: Uuid,
    kind: &str,
    url: &str,
    position: i32,
    metadata: serde_json::Value,
) -> Result<Media, sqlx::Error> {
    sqlx::query_as::<_, Media>(&format!(
        r#"
        INSERT INTO media (id, story_id, kind, url, position, metadata)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {MEDIA_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(story_id)
    .bind(kind)
    .bind(url)
    .bind(position)
    .bind(metadata)
    .fetch_one(pool)
    .await
}

pub async fn list_for_story(pool: &PgPool, story_id: Uuid) -> Result<Vec<Media>, sqlx::Error> {
    sqlx::query_as::<_, Media>(&format!(
        r#"
        SELECT {MEDIA_COLUMNS}
        FROM media
        WHERE story_id = $1
        ORDER BY position ASC, created_at ASC
        "#
    ))
    .bind(story_id)
    .fetch_all(pool)
    .await
}

/// Media of several stories at once, for feed assembly
pub async fn list_for_stories(
    pool: &PgPool,
    story_ids: &[Uuid],
) -> Result<Vec<Media>, sqlx::Error> {
    sqlx::query_as::<_, Media>(&format!(
        r#"
        SELECT {MEDIA_COLUMNS}
        FROM media
        WHERE story_id = ANY($1)
        ORDER BY story_id, position ASC, created_at ASC
        "#
    ))
    .bind(story_ids)
    .fetch_all(pool)
    .await
}

/// Move an attachment within its story's ordering; returns false when the
/// media row does not belong to the story
pub async fn update_position(
    pool: &PgPool,
    story_id: Uuid,
    media_id: Uuid,
    position: i32,
) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query(
        "UPDATE media SET position = $1, updated_at = NOW() WHERE id = $2 AND story_id = $3",
    )
    .bind(position)
    .bind(media_id)
    .bind(story_id)
    .execute(pool)
    .await?
    .rows_affected();
    Ok(affected > 0)
}

/// Returns false when the media row does not belong to the story
pub async fn detach_media(
    pool: &PgPool,
    story_id: Uuid,
    media_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let affected = sqlx::query("DELETE FROM media WHERE id = $1 AND story_id = $2")
        .bind(media_id)
        .bind(story_id)
        .execute(pool)
        .await?
        .rows_affected();
    Ok(affected > 0)
}
