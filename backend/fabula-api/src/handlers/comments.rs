/// Comment handlers
use crate::envelope;
use crate::error::Result;
use crate::handlers::{page_params, PageQuery, DEFAULT_PAGE_SIZE};
use crate::middleware::AuthenticatedUser;
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    story_id: web::Path<Uuid>,
    req: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    let comment = service
        .create_comment(*story_id, user.id, &req.content, req.parent_id)
        .await?;

    Ok(envelope::created("Comment created successfully", comment))
}

pub async fn get_story_comments(
    pool: web::Data<PgPool>,
    story_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let service = CommentService::new((**pool).clone());
    let comments = service.get_story_comments(*story_id, page, limit).await?;

    Ok(envelope::ok("Comments retrieved successfully", comments))
}

pub async fn get_replies(
    pool: web::Data<PgPool>,
    comment_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let service = CommentService::new((**pool).clone());
    let replies = service.get_replies(*comment_id, page, limit).await?;

    Ok(envelope::ok("Replies retrieved successfully", replies))
}

pub async fn update_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    comment_id: web::Path<Uuid>,
    req: web::Json<UpdateCommentRequest>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    let comment = service.update_comment(*comment_id, user.id, &req.content).await?;

    Ok(envelope::ok("Comment updated successfully", comment))
}

pub async fn delete_comment(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    comment_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = CommentService::new((**pool).clone());
    service.delete_comment(*comment_id, user.id).await?;

    Ok(envelope::ok_empty("Comment deleted successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCommentRequest {
    pub content: String,
}
