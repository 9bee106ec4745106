/// Messaging Engine
///
/// Message send and read with membership enforcement. Reads maintain two
/// best-effort markers: each returned message's `read_by` set grows to
/// include the reader, and the reader's participant row records the newest
/// message id fetched (`last_read_message_id`). Neither is exactly-once
/// delivery tracking.
use crate::cache::MembershipCache;
use crate::error::{AppError, Result};
use crate::models::{Message, Pagination};
use crate::services::conversation_service::{ConversationService, SenderInfo};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub content: String,
    pub read_by: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub sender: SenderInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<MessageView>,
    pub pagination: Pagination,
}

pub struct MessageService {
    pool: PgPool,
    cache: MembershipCache,
}

impl MessageService {
    pub fn new(pool: PgPool, cache: MembershipCache) -> Self {
        Self { pool, cache }
    }

    async fn conversation_exists(&self, conversation_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn is_member(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        ConversationService::new(self.pool.clone(), self.cache.clone())
            .is_member_cached(conversation_id, user_id)
            .await
    }

    /// Send a message. The insert and the conversation's `last_message_at`
    /// bump commit together or not at all.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<Message> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(AppError::InvalidInput("Message content is required".into()));
        }

        if !self.conversation_exists(conversation_id).await? {
            return Err(AppError::NotFound("Conversation not found".into()));
        }

        if !self.is_member(conversation_id, sender_id).await? {
            return Err(AppError::Forbidden(
                "User is not a participant in this conversation".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, read_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, conversation_id, sender_id, content, read_by, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(trimmed)
        .bind(serde_json::json!([sender_id]))
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET last_message_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(message)
    }

    /// Fetch a page of messages, newest first. Marks every returned message
    /// as read by the caller and advances the caller's read cursor to the
    /// newest message id in the page.
    pub async fn get_messages(
        &self,
        conversation_id: Uuid,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<MessagePage> {
        if !self.conversation_exists(conversation_id).await? {
            return Err(AppError::NotFound("Conversation not found".into()));
        }

        if !self.is_member(conversation_id, user_id).await? {
            return Err(AppError::Forbidden(
                "User is not a participant in this conversation".into(),
            ));
        }

        let offset = (page - 1) * limit;

        let total: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE conversation_id = $1")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await?
                .get("count");

        let rows = sqlx::query(
            r#"
            SELECT m.id, m.conversation_id, m.content, m.read_by, m.created_at,
                   u.id AS sender_id, u.username AS sender_username
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id = $1
            ORDER BY m.created_at DESC, m.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(conversation_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let mut messages = Vec::with_capacity(rows.len());
        let mut unread_ids = Vec::new();

        for row in rows {
            let Json(mut read_by): Json<Vec<Uuid>> = row.get("read_by");
            let id: Uuid = row.get("id");

            if !read_by.contains(&user_id) {
                unread_ids.push(id);
                read_by.push(user_id);
            }

            messages.push(MessageView {
                id,
                conversation_id: row.get("conversation_id"),
                content: row.get("content"),
                read_by,
                created_at: row.get("created_at"),
                sender: SenderInfo {
                    id: row.get("sender_id"),
                    username: row.get("sender_username"),
                },
            });
        }

        if !unread_ids.is_empty() {
            sqlx::query(
                r#"
                UPDATE messages
                SET read_by = read_by || $2
                WHERE id = ANY($1) AND NOT read_by @> $2
                "#,
            )
            .bind(&unread_ids)
            .bind(serde_json::json!([user_id]))
            .execute(&self.pool)
            .await?;
        }

        // Cursor is "most recent message the user has fetched", which is the
        // first entry of a newest-first page
        if let Some(newest) = messages.first() {
            sqlx::query(
                r#"
                UPDATE conversation_participants
                SET last_read_message_id = $1, updated_at = NOW()
                WHERE conversation_id = $2 AND user_id = $3
                "#,
            )
            .bind(newest.id)
            .bind(conversation_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        }

        Ok(MessagePage {
            messages,
            pagination: Pagination::new(total, page, limit),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_view_serializes_camel_case() {
        let view = MessageView {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            content: "hi".into(),
            read_by: vec![Uuid::new_v4()],
            created_at: Utc::now(),
            sender: SenderInfo {
                id: Uuid::new_v4(),
                username: "alice".into(),
            },
        };
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("conversationId").is_some());
        assert!(value.get("readBy").is_some());
        assert!(value.get("createdAt").is_some());
        assert!(value["sender"].get("username").is_some());
    }
}
