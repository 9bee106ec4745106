use crate::models::Comment;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const COMMENT_COLUMNS: &str =
    "id, story_id, user_id, content, parent_id, edited, created_at, updated_at";

pub async fn create_comment(
    pool: &PgPool,
    story_id: Uuid,
    user_id: Uuid,
    content: &str,
    parent_id: Option<Uuid>,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (id, story_id, user_id, content, parent_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(story_id)
    .bind(user_id)
    .bind(content)
    .bind(parent_id)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, comment_id: Uuid) -> Result<Option<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        "SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"
    ))
    .bind(comment_id)
    .fetch_optional(pool)
    .await
}

/// Top-level comments of a story, newest first
pub async fn list_top_level(
    pool: &PgPool,
    story_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Comment>, i64), sqlx::Error> {
    let count_row = sqlx::query(
        "SELECT COUNT(*) AS count FROM comments WHERE story_id = $1 AND parent_id IS NULL",
    )
    .bind(story_id)
    .fetch_one(pool)
    .await?;
    let total: i64 = count_row.get("count");

    let comments = sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE story_id = $1 AND parent_id IS NULL
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(story_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((comments, total))
}

/// Replies to a comment, oldest first
pub async fn list_replies(
    pool: &PgPool,
    parent_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Comment>, i64), sqlx::Error> {
    let count_row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE parent_id = $1")
        .bind(parent_id)
        .fetch_one(pool)
        .await?;
    let total: i64 = count_row.get("count");

    let replies = sqlx::query_as::<_, Comment>(&format!(
        r#"
        SELECT {COMMENT_COLUMNS}
        FROM comments
        WHERE parent_id = $1
        ORDER BY created_at ASC, id ASC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(parent_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((replies, total))
}

/// Total comments on a story, replies included
pub async fn count_for_story(pool: &PgPool, story_id: Uuid) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM comments WHERE story_id = $1")
        .bind(story_id)
        .fetch_one(pool)
        .await?;
    Ok(row.get::<i64, _>("count"))
}

pub async fn update_content(
    pool: &PgPool,
    comment_id: Uuid,
    content: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(&format!(
        r#"
        UPDATE comments
        SET content = $1, edited = TRUE, updated_at = NOW()
        WHERE id = $2
        RETURNING {COMMENT_COLUMNS}
        "#
    ))
    .bind(content)
    .bind(comment_id)
    .fetch_one(pool)
    .await
}

/// Delete a comment and its direct replies inside the caller's transaction
pub async fn delete_with_replies(
    tx: &mut Transaction<'_, Postgres>,
    comment_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM comments WHERE parent_id = $1")
        .bind(comment_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
