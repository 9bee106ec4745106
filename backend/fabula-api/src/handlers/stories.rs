/// Story handlers - CRUD, status transitions, media, likes
use crate::db::story_repo::StoryFilters;
use crate::envelope;
use crate::error::Result;
use crate::handlers::{page_params, DEFAULT_PAGE_SIZE};
use crate::middleware::AuthenticatedUser;
use crate::services::{LikeService, StoryService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<CreateStoryRequest>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let story = service
        .create_story(
            user.id,
            &req.title,
            &req.content,
            req.category.as_deref(),
            req.tags.clone().unwrap_or_default(),
        )
        .await?;

    Ok(envelope::created("Story created successfully", story))
}

pub async fn get_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let story = service.get_story(*story_id, user.id).await?;

    Ok(envelope::ok("Story retrieved successfully", story))
}

pub async fn list_stories(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    query: web::Query<ListStoriesQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let filters = StoryFilters {
        user_id: query.user_id,
        status: query.status.clone(),
        category: query.category.clone(),
        search: query.search.clone(),
    };

    let service = StoryService::new((**pool).clone());
    let stories = service.list_stories(user.id, filters, page, limit).await?;

    Ok(envelope::ok("Stories retrieved successfully", stories))
}

pub async fn update_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
    req: web::Json<UpdateStoryRequest>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let story = service
        .update_story(
            *story_id,
            user.id,
            req.title.as_deref(),
            req.content.as_deref(),
            req.category.as_deref(),
            req.tags.clone(),
        )
        .await?;

    Ok(envelope::ok("Story updated successfully", story))
}

pub async fn publish_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let story = service.publish_story(*story_id, user.id).await?;

    Ok(envelope::ok("Story published successfully", story))
}

pub async fn archive_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let story = service.archive_story(*story_id, user.id).await?;

    Ok(envelope::ok("Story archived successfully", story))
}

pub async fn delete_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    service.delete_story(*story_id, user.id).await?;

    Ok(envelope::ok_empty("Story deleted successfully"))
}

pub async fn attach_media(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
    req: web::Json<AttachMediaRequest>,
) -> Result<HttpResponse> {
    let service = StoryService::new((**pool).clone());
    let media = service
        .attach_media(
            *story_id,
            user.id,
            &req.kind,
            &req.url,
            req.position.unwrap_or(0),
            req.metadata.clone(),
        )
        .await?;

    Ok(envelope::created("Media attached successfully", media))
}

pub async fn reorder_media(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
    req: web::Json<ReorderMediaRequest>,
) -> Result<HttpResponse> {
    let (story_id, media_id) = *path;
    let service = StoryService::new((**pool).clone());
    let media = service
        .reorder_media(story_id, media_id, user.id, req.position)
        .await?;

    Ok(envelope::ok("Media reordered successfully", media))
}

pub async fn detach_media(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (story_id, media_id) = *path;
    let service = StoryService::new((**pool).clone());
    service.detach_media(story_id, media_id, user.id).await?;

    Ok(envelope::ok_empty("Media removed successfully"))
}

pub async fn like_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = LikeService::new((**pool).clone());
    let like = service.like_story(*story_id, user.id).await?;

    Ok(envelope::created("Story liked successfully", like))
}

pub async fn unlike_story(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = LikeService::new((**pool).clone());
    service.unlike_story(*story_id, user.id).await?;

    Ok(envelope::ok_empty("Like removed successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderMediaRequest {
    pub position: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachMediaRequest {
    pub kind: String,
    pub url: String,
    pub position: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListStoriesQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub user_id: Option<Uuid>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}
