/// Feed handlers
use crate::envelope;
use crate::error::Result;
use crate::handlers::{page_params, DEFAULT_PAGE_SIZE};
use crate::middleware::AuthenticatedUser;
use crate::services::feed_service::{FeedSort, SortOrder};
use crate::services::FeedService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

pub async fn get_feed(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<FeedRequest>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(req.page, req.limit, DEFAULT_PAGE_SIZE);
    let sort_by = FeedSort::parse(req.sort_by.as_deref())?;
    let sort_order = SortOrder::parse(req.sort_order.as_deref())?;

    let service = FeedService::new((**pool).clone());
    let feed = service
        .get_friends_feed(user.id, page, limit, sort_by, sort_order)
        .await?;

    Ok(envelope::ok("Feed retrieved successfully", feed))
}

pub async fn get_discover(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<DiscoverRequest>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(req.page, req.limit, DEFAULT_PAGE_SIZE);

    let service = FeedService::new((**pool).clone());
    let feed = service.get_discover_feed(user.id, page, limit).await?;

    Ok(envelope::ok("Discover feed retrieved successfully", feed))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoverRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
