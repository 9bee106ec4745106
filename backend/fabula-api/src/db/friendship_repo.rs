use crate::models::Friendship;
use sqlx::{PgPool, Row};
use uuid::Uuid;

const FRIENDSHIP_COLUMNS: &str = "id, user_id, friend_id, status, created_at, updated_at";

/// Any row between the two users, regardless of direction or status
pub async fn find_between(
    pool: &PgPool,
    a: Uuid,
    b: Uuid,
) -> Result<Option<Friendship>, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(&format!(
        r#"
        SELECT {FRIENDSHIP_COLUMNS}
        FROM friendships
        WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        "#
    ))
    .bind(a)
    .bind(b)
    .fetch_optional(pool)
    .await
}

pub async fn create_request(
    pool: &PgPool,
    user_id: Uuid,
    friend_id: Uuid,
) -> Result<Friendship, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(&format!(
        r#"
        INSERT INTO friendships (id, user_id, friend_id, status)
        VALUES ($1, $2, $3, 'pending')
        RETURNING {FRIENDSHIP_COLUMNS}
        "#
    ))
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(friend_id)
    .fetch_one(pool)
    .await
}

/// The pending request sent by `requester` to `recipient`, if any
pub async fn find_pending_request(
    pool: &PgPool,
    requester: Uuid,
    recipient: Uuid,
) -> Result<Option<Friendship>, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(&format!(
        r#"
        SELECT {FRIENDSHIP_COLUMNS}
        FROM friendships
        WHERE user_id = $1 AND friend_id = $2 AND status = 'pending'
        "#
    ))
    .bind(requester)
    .bind(recipient)
    .fetch_optional(pool)
    .await
}

pub async fn set_status(
    pool: &PgPool,
    friendship_id: Uuid,
    status: &str,
) -> Result<Friendship, sqlx::Error> {
    sqlx::query_as::<_, Friendship>(&format!(
        r#"
        UPDATE friendships
        SET status = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING {FRIENDSHIP_COLUMNS}
        "#
    ))
    .bind(status)
    .bind(friendship_id)
    .fetch_one(pool)
    .await
}

pub async fn delete(pool: &PgPool, friendship_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM friendships WHERE id = $1")
        .bind(friendship_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Ids of accepted friends, read symmetrically from both edge directions
pub async fn accepted_friend_ids(pool: &PgPool, user_id: Uuid) -> Result<Vec<Uuid>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT friend_id AS other FROM friendships WHERE user_id = $1 AND status = 'accepted'
        UNION
        SELECT user_id AS other FROM friendships WHERE friend_id = $1 AND status = 'accepted'
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.get("other")).collect())
}

/// Incoming pending requests with requester info
pub async fn list_incoming_pending(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<(Friendship, String)>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT f.id, f.user_id, f.friend_id, f.status, f.created_at, f.updated_at,
               u.username AS requester_username
        FROM friendships f
        JOIN users u ON u.id = f.user_id
        WHERE f.friend_id = $1 AND f.status = 'pending'
        ORDER BY f.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let friendship = Friendship {
                id: row.get("id"),
                user_id: row.get("user_id"),
                friend_id: row.get("friend_id"),
                status: row.get("status"),
                created_at: row.get("created_at"),
                updated_at: row.get("updated_at"),
            };
            let username: String = row.get("requester_username");
            (friendship, username)
        })
        .collect())
}
