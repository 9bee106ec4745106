/// Friendship handlers
use crate::envelope;
use crate::error::Result;
use crate::middleware::AuthenticatedUser;
use crate::services::FriendService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn send_request(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<SendRequestBody>,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    let friendship = service.send_request(user.id, req.friend_id).await?;

    Ok(envelope::created("Friend request sent successfully", friendship))
}

pub async fn accept_request(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    requester_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    let friendship = service.accept_request(user.id, *requester_id).await?;

    Ok(envelope::ok("Friend request accepted successfully", friendship))
}

pub async fn reject_request(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    requester_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    service.reject_request(user.id, *requester_id).await?;

    Ok(envelope::ok_empty("Friend request rejected successfully"))
}

pub async fn remove_friend(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    friend_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    service.remove_friend(user.id, *friend_id).await?;

    Ok(envelope::ok_empty("Friend removed successfully"))
}

pub async fn list_friends(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    let friends = service.list_friends(user.id).await?;

    Ok(envelope::ok("Friends retrieved successfully", friends))
}

pub async fn list_requests(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let service = FriendService::new((**pool).clone());
    let requests = service.list_pending_requests(user.id).await?;

    Ok(envelope::ok("Pending requests retrieved successfully", requests))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequestBody {
    pub friend_id: Uuid,
}
