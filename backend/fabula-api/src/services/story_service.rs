/// Story service - authored content lifecycle and media attachment
///
/// Stories start as drafts and are published or archived by their owner.
/// Only published stories are visible to other users and to the feeds.
/// Deleting a story removes its media, comments and likes in one
/// transaction.
use crate::db::{comment_repo, like_repo, media_repo, story_repo};
use crate::error::{AppError, Result};
use crate::models::{Media, MediaKind, Pagination, Story, StoryStatus};
use chrono::Utc;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub media: Vec<Media>,
    pub like_count: i64,
    pub comment_count: i64,
    pub user_liked: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    pub stories: Vec<Story>,
    pub pagination: Pagination,
}

pub struct StoryService {
    pool: PgPool,
}

impl StoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_story(
        &self,
        user_id: Uuid,
        title: &str,
        content: &str,
        category: Option<&str>,
        tags: Vec<String>,
    ) -> Result<Story> {
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title is required".into()));
        }
        if content.trim().is_empty() {
            return Err(AppError::InvalidInput("Content is required".into()));
        }

        let story =
            story_repo::create_story(&self.pool, user_id, title.trim(), content, category, &tags)
                .await?;
        Ok(story)
    }

    /// Fetch a story for a viewer, with media and engagement annotations.
    /// Drafts and archived stories are only visible to their owner. Each
    /// fetch by a non-owner counts as a view.
    pub async fn get_story(&self, story_id: Uuid, viewer_id: Uuid) -> Result<StoryDetail> {
        let story = story_repo::find_by_id(&self.pool, story_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found".into()))?;

        if story.user_id != viewer_id && story.status != StoryStatus::Published.as_str() {
            return Err(AppError::NotFound("Story not found".into()));
        }

        if story.user_id != viewer_id {
            story_repo::increment_view_count(&self.pool, story_id).await?;
        }

        let media = media_repo::list_for_story(&self.pool, story_id).await?;
        let like_count = like_repo::count_likes(&self.pool, story_id).await?;
        let comment_count = comment_repo::count_for_story(&self.pool, story_id).await?;
        let user_liked = like_repo::user_liked(&self.pool, story_id, viewer_id).await?;

        Ok(StoryDetail {
            story,
            media,
            like_count,
            comment_count,
            user_liked,
        })
    }

    pub async fn list_stories(
        &self,
        viewer_id: Uuid,
        mut filters: story_repo::StoryFilters,
        page: i64,
        limit: i64,
    ) -> Result<StoryPage> {
        if let Some(ref status) = filters.status {
            StoryStatus::try_from(status.as_str())?;
        }

        // Other users' drafts and archives are never listable
        if filters.user_id != Some(viewer_id) {
            filters.status = Some(StoryStatus::Published.as_str().to_string());
        }

        let offset = (page - 1) * limit;
        let (stories, total) = story_repo::list_stories(&self.pool, &filters, limit, offset).await?;

        Ok(StoryPage {
            stories,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn update_story(
        &self,
        story_id: Uuid,
        owner_id: Uuid,
        title: Option<&str>,
        content: Option<&str>,
        category: Option<&str>,
        tags: Option<Vec<String>>,
    ) -> Result<Story> {
        let existing = story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        let title = title.unwrap_or(&existing.title);
        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title is required".into()));
        }
        let content = content.unwrap_or(&existing.content);
        let category = category.or(existing.category.as_deref());
        let tags = tags.unwrap_or_else(|| existing.tags.0.clone());

        let story =
            story_repo::update_story(&self.pool, story_id, title, content, category, &tags).await?;
        Ok(story)
    }

    pub async fn publish_story(&self, story_id: Uuid, owner_id: Uuid) -> Result<Story> {
        let existing = story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        if existing.status == StoryStatus::Published.as_str() {
            return Err(AppError::Conflict("Story is already published".into()));
        }

        let story = story_repo::set_status(
            &self.pool,
            story_id,
            StoryStatus::Published.as_str(),
            Some(Utc::now()),
        )
        .await?;
        Ok(story)
    }

    pub async fn archive_story(&self, story_id: Uuid, owner_id: Uuid) -> Result<Story> {
        let existing = story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        if existing.status == StoryStatus::Archived.as_str() {
            return Err(AppError::Conflict("Story is already archived".into()));
        }

        let story =
            story_repo::set_status(&self.pool, story_id, StoryStatus::Archived.as_str(), None)
                .await?;
        Ok(story)
    }

    pub async fn delete_story(&self, story_id: Uuid, owner_id: Uuid) -> Result<()> {
        story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        let mut tx = self.pool.begin().await?;
        story_repo::delete_story_cascade(&mut tx, story_id).await?;
        tx.commit().await?;

        Ok(())
    }

    pub async fn attach_media(
        &self,
        story_id: Uuid,
        owner_id: Uuid,
        kind: &str,
        url: &str,
        position: i32,
        metadata: Option<serde_json::Value>,
    ) -> Result<Media> {
        story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        let kind = MediaKind::try_from(kind)?;
        if url.trim().is_empty() {
            return Err(AppError::InvalidInput("Media URL is required".into()));
        }

        let media = media_repo::attach_media(
            &self.pool,
            story_id,
            kind.as_str(),
            url.trim(),
            position,
            metadata.unwrap_or_else(|| serde_json::json!({})),
        )
        .await?;
        Ok(media)
    }

    pub async fn reorder_media(
        &self,
        story_id: Uuid,
        media_id: Uuid,
        owner_id: Uuid,
        position: i32,
    ) -> Result<Vec<Media>> {
        story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        if !media_repo::update_position(&self.pool, story_id, media_id, position).await? {
            return Err(AppError::NotFound("Media not found".into()));
        }

        let media = media_repo::list_for_story(&self.pool, story_id).await?;
        Ok(media)
    }

    pub async fn detach_media(&self, story_id: Uuid, media_id: Uuid, owner_id: Uuid) -> Result<()> {
        story_repo::find_owned(&self.pool, story_id, owner_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Story not found or unauthorized".into()))?;

        if !media_repo::detach_media(&self.pool, story_id, media_id).await? {
            return Err(AppError::NotFound("Media not found".into()));
        }
        Ok(())
    }
}
