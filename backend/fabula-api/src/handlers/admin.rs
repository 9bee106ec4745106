/// Admin handlers - moderation dashboard surface
///
/// Every handler here takes `AdminUser`, so non-admin callers are rejected
/// with 403 before any service runs.
use crate::envelope;
use crate::error::Result;
use crate::handlers::{page_params, PageQuery, DEFAULT_PAGE_SIZE};
use crate::middleware::AdminUser;
use crate::services::AdminService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;

pub async fn list_users(
    pool: web::Data<PgPool>,
    _admin: AdminUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let service = AdminService::new((**pool).clone());
    let users = service.list_users(page, limit).await?;

    Ok(envelope::ok("Users retrieved successfully", users))
}

pub async fn block_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = AdminService::new((**pool).clone());
    service.block_user(admin.0.id, *user_id).await?;

    Ok(envelope::ok_empty("User blocked successfully"))
}

pub async fn unblock_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = AdminService::new((**pool).clone());
    service.unblock_user(admin.0.id, *user_id).await?;

    Ok(envelope::ok_empty("User unblocked successfully"))
}

pub async fn delete_user(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = AdminService::new((**pool).clone());
    service.delete_user(admin.0.id, *user_id).await?;

    Ok(envelope::ok_empty("User deleted successfully"))
}

pub async fn delete_story(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    story_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = AdminService::new((**pool).clone());
    service.delete_story(admin.0.id, *story_id).await?;

    Ok(envelope::ok_empty("Story deleted successfully"))
}

pub async fn delete_conversation(
    pool: web::Data<PgPool>,
    admin: AdminUser,
    conversation_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = AdminService::new((**pool).clone());
    service.delete_conversation(admin.0.id, *conversation_id).await?;

    Ok(envelope::ok_empty("Conversation deleted successfully"))
}
