/// Like service
///
/// A user may like a story at most once; the (story, user) unique pair is
/// enforced by the database and surfaced as `Conflict`. Unlike is
/// idempotent.
use crate::db::{like_repo, story_repo};
use crate::error::{AppError, Result};
use crate::models::{Like, StoryStatus};
use sqlx::PgPool;
use uuid::Uuid;

pub struct LikeService {
    pool: PgPool,
}

impl LikeService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn like_story(&self, story_id: Uuid, user_id: Uuid) -> Result<Like> {
        let story = story_repo::find_by_id(&self.pool, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        if story.status != StoryStatus::Published.as_str() && story.user_id != user_id {
            return Err(AppError::NotFound("Story not found".into()));
        }

        match like_repo::create_like(&self.pool, story_id, user_id).await? {
            Some(like) => Ok(like),
            None => Err(AppError::Conflict("Story already liked".into())),
        }
    }

    /// Removing a like that does not exist is not an error
    pub async fn unlike_story(&self, story_id: Uuid, user_id: Uuid) -> Result<bool> {
        story_repo::find_by_id(&self.pool, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        let removed = like_repo::delete_like(&self.pool, story_id, user_id).await?;
        Ok(removed)
    }
}
