use crate::models::Story;
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

const STORY_COLUMNS: &str = "id, user_id, title, content, status, category, tags, view_count, \
     published_at, created_at, updated_at";

pub async fn create_story(
    pool: &PgPool,
    user_id: Uuid,
    title: &str,
    content: &str,
    category: Option<&str>,
    tags: &[String],
) -> Result<Story, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        r#"
        INSERT INTO stories (id, user_id, title, content, category, tags)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {STORY_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(serde_json::json!(tags))
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, story_id: Uuid) -> Result<Option<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
    ))
    .bind(story_id)
    .fetch_optional(pool)
    .await
}

/// Owner-scoped fetch; `None` also covers "exists but not yours"
pub async fn find_owned(
    pool: &PgPool,
    story_id: Uuid,
    owner_id: Uuid,
) -> Result<Option<Story>, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND user_id = $2"
    ))
    .bind(story_id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn update_story(
    pool: &PgPool,
    story_id: Uuid,
    title: &str,
    content: &str,
    category: Option<&str>,
    tags: &[String],
) -> Result<Story, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        r#"
        UPDATE stories
        SET title = $1, content = $2, category = $3, tags = $4, updated_at = NOW()
        WHERE id = $5
        RETURNING {STORY_COLUMNS}
        "#
    ))
    .bind(title)
    .bind(content)
    .bind(category)
    .bind(serde_json::json!(tags))
    .bind(story_id)
    .fetch_one(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    story_id: Uuid,
    status: &str,
    published_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<Story, sqlx::Error> {
    sqlx::query_as::<_, Story>(&format!(
        r#"
        UPDATE stories
        SET status = $1,
            published_at = COALESCE($2, published_at),
            updated_at = NOW()
        WHERE id = $3
        RETURNING {STORY_COLUMNS}
        "#
    ))
    .bind(status)
    .bind(published_at)
    .bind(story_id)
    .fetch_one(pool)
    .await
}

pub async fn increment_view_count(pool: &PgPool, story_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE stories SET view_count = view_count + 1 WHERE id = $1")
        .bind(story_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Delete a story and everything hanging off it, inside the caller's
/// transaction: likes, comments (replies share the story_id, so one statement
/// covers them), media, then the story row.
pub async fn delete_story_cascade(
    tx: &mut Transaction<'_, Postgres>,
    story_id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM likes WHERE story_id = $1")
        .bind(story_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM comments WHERE story_id = $1")
        .bind(story_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM media WHERE story_id = $1")
        .bind(story_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM stories WHERE id = $1")
        .bind(story_id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

pub struct StoryFilters {
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

pub async fn list_stories(
    pool: &PgPool,
    filters: &StoryFilters,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Story>, i64), sqlx::Error> {
    // Optional filters are folded into the WHERE clause as "param IS NULL OR"
    // disjunctions so one prepared statement covers every combination.
    let where_clause = r#"
        WHERE ($1::uuid IS NULL OR user_id = $1)
          AND ($2::text IS NULL OR status = $2)
          AND ($3::text IS NULL OR category = $3)
          AND ($4::text IS NULL OR title ILIKE '%' || $4 || '%' OR content ILIKE '%' || $4 || '%')
    "#;

    let count_row = sqlx::query(&format!("SELECT COUNT(*) AS count FROM stories {where_clause}"))
        .bind(filters.user_id)
        .bind(filters.status.as_deref())
        .bind(filters.category.as_deref())
        .bind(filters.search.as_deref())
        .fetch_one(pool)
        .await?;
    let total: i64 = count_row.get("count");

    let stories = sqlx::query_as::<_, Story>(&format!(
        r#"
        SELECT {STORY_COLUMNS}
        FROM stories
        {where_clause}
        ORDER BY created_at DESC, id DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(filters.user_id)
    .bind(filters.status.as_deref())
    .bind(filters.category.as_deref())
    .bind(filters.search.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok((stories, total))
}
