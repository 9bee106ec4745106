/// Comment service - one-level-deep reply threading on published stories
///
/// A reply's parent must be a top-level comment on the same story; both
/// rules are enforced here at the write boundary rather than by schema
/// constraints alone. Deleting a comment removes its direct replies in the
/// same transaction.
use crate::db::{comment_repo, story_repo};
use crate::error::{AppError, Result};
use crate::models::{Comment, Pagination, StoryStatus};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentWithReplies {
    #[serde(flatten)]
    pub comment: Comment,
    pub reply_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentPage {
    pub comments: Vec<CommentWithReplies>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyPage {
    pub replies: Vec<Comment>,
    pub pagination: Pagination,
}

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_comment(
        &self,
        story_id: Uuid,
        user_id: Uuid,
        content: &str,
        parent_id: Option<Uuid>,
    ) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput("Comment content is required".into()));
        }

        let story = story_repo::find_by_id(&self.pool, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        if story.status != StoryStatus::Published.as_str() && story.user_id != user_id {
            return Err(AppError::NotFound("Story not found".into()));
        }

        if let Some(parent_id) = parent_id {
            let parent = comment_repo::find_by_id(&self.pool, parent_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Parent comment not found".into()))?;

            if parent.story_id != story_id {
                return Err(AppError::InvalidInput(
                    "Parent comment belongs to a different story".into(),
                ));
            }

            if parent.parent_id.is_some() {
                return Err(AppError::InvalidInput(
                    "Replies can only be one level deep".into(),
                ));
            }
        }

        let comment =
            comment_repo::create_comment(&self.pool, story_id, user_id, content, parent_id).await?;
        Ok(comment)
    }

    pub async fn get_story_comments(
        &self,
        story_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<CommentPage> {
        story_repo::find_by_id(&self.pool, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        let offset = (page - 1) * limit;
        let (comments, total) =
            comment_repo::list_top_level(&self.pool, story_id, limit, offset).await?;

        // Reply counts for the page in one query
        let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
        let mut reply_counts = std::collections::HashMap::new();
        if !ids.is_empty() {
            let rows = sqlx::query(
                r#"
                SELECT parent_id, COUNT(*) AS count
                FROM comments
                WHERE parent_id = ANY($1)
                GROUP BY parent_id
                "#,
            )
            .bind(&ids)
            .fetch_all(&self.pool)
            .await?;
            for row in rows {
                let parent_id: Uuid = row.get("parent_id");
                let count: i64 = row.get("count");
                reply_counts.insert(parent_id, count);
            }
        }

        let comments = comments
            .into_iter()
            .map(|comment| {
                let reply_count = reply_counts.get(&comment.id).copied().unwrap_or(0);
                CommentWithReplies {
                    comment,
                    reply_count,
                }
            })
            .collect();

        Ok(CommentPage {
            comments,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn get_replies(&self, comment_id: Uuid, page: i64, limit: i64) -> Result<ReplyPage> {
        comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        let offset = (page - 1) * limit;
        let (replies, total) = comment_repo::list_replies(&self.pool, comment_id, limit, offset).await?;

        Ok(ReplyPage {
            replies,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn update_comment(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::InvalidInput("Comment content is required".into()));
        }

        let existing = comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        if existing.user_id != user_id {
            return Err(AppError::Forbidden("You can only edit your own comments".into()));
        }

        let comment = comment_repo::update_content(&self.pool, comment_id, content).await?;
        Ok(comment)
    }

    pub async fn delete_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<()> {
        let existing = comment_repo::find_by_id(&self.pool, comment_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".into()))?;

        if existing.user_id != user_id {
            return Err(AppError::Forbidden(
                "You can only delete your own comments".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        comment_repo::delete_with_replies(&mut tx, comment_id).await?;
        tx.commit().await?;

        Ok(())
    }
}
