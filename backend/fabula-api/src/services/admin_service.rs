/// Moderation service - admin-only account and content controls
///
/// Deletions are physical and cascade through every dependent row inside a
/// single transaction; a failure anywhere rolls the whole operation back.
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::models::{Pagination, PublicUser};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserView {
    #[serde(flatten)]
    pub user: PublicUser,
    pub is_blocked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<AdminUserView>,
    pub pagination: Pagination,
}

pub struct AdminService {
    pool: PgPool,
}

impl AdminService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_users(&self, page: i64, limit: i64) -> Result<UserPage> {
        let offset = (page - 1) * limit;
        let total = user_repo::count_users(&self.pool).await?;
        let users = user_repo::list_users(&self.pool, limit, offset).await?;

        let users = users
            .into_iter()
            .map(|u| {
                let is_blocked = u.is_blocked;
                AdminUserView {
                    user: u.into(),
                    is_blocked,
                }
            })
            .collect();

        Ok(UserPage {
            users,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn block_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<()> {
        if admin_id == user_id {
            return Err(AppError::InvalidOperation("Cannot block yourself".into()));
        }

        if !user_repo::set_blocked(&self.pool, user_id, true).await? {
            return Err(AppError::NotFound("User not found".into()));
        }

        tracing::info!(actor = %admin_id, target = %user_id, "user blocked");
        Ok(())
    }

    pub async fn unblock_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<()> {
        if !user_repo::set_blocked(&self.pool, user_id, false).await? {
            return Err(AppError::NotFound("User not found".into()));
        }

        tracing::info!(actor = %admin_id, target = %user_id, "user unblocked");
        Ok(())
    }

    /// Delete a user and every row that references them: likes and comments
    /// by them or on their stories, their stories with media, friendships,
    /// messages, and conversation memberships.
    pub async fn delete_user(&self, admin_id: Uuid, user_id: Uuid) -> Result<()> {
        if admin_id == user_id {
            return Err(AppError::InvalidOperation("Cannot delete yourself".into()));
        }

        user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM likes
            WHERE user_id = $1
               OR story_id IN (SELECT id FROM stories WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        // Replies to comments that are about to go away, wherever they live
        sqlx::query(
            r#"
            DELETE FROM comments
            WHERE parent_id IN (
                SELECT id FROM comments
                WHERE user_id = $1
                   OR story_id IN (SELECT id FROM stories WHERE user_id = $1)
            )
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            DELETE FROM comments
            WHERE user_id = $1
               OR story_id IN (SELECT id FROM stories WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM media WHERE story_id IN (SELECT id FROM stories WHERE user_id = $1)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM stories WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM friendships WHERE user_id = $1 OR friend_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM messages WHERE sender_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM conversation_participants WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %admin_id, target = %user_id, "user deleted");
        Ok(())
    }

    /// Delete any story regardless of owner: likes, comments (replies share
    /// the story), media, then the story
    pub async fn delete_story(&self, admin_id: Uuid, story_id: Uuid) -> Result<()> {
        let exists = sqlx::query("SELECT 1 AS one FROM stories WHERE id = $1")
            .bind(story_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::NotFound("Story not found".into()));
        }

        let mut tx = self.pool.begin().await?;
        crate::db::story_repo::delete_story_cascade(&mut tx, story_id).await?;
        tx.commit().await?;

        tracing::info!(actor = %admin_id, target = %story_id, "story deleted");
        Ok(())
    }

    /// Delete any conversation regardless of participant admin rights
    pub async fn delete_conversation(&self, admin_id: Uuid, conversation_id: Uuid) -> Result<()> {
        let exists = sqlx::query("SELECT 1 AS one FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::NotFound("Conversation not found".into()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(actor = %admin_id, target = %conversation_id, "conversation deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_page_serializes_flat_user_with_block_flag() {
        let view = AdminUserView {
            user: PublicUser {
                id: Uuid::new_v4(),
                email: "a@b.c".into(),
                username: "ab".into(),
                role: "user".into(),
                created_at: chrono::Utc::now(),
            },
            is_blocked: true,
        };
        let value = serde_json::to_value(&view).unwrap();
        assert!(value.get("username").is_some());
        assert_eq!(value["isBlocked"], true);
    }
}
