/// Friendship service
///
/// Friendships are stored as one row per unordered user pair; the "at most
/// one row per pair" invariant is enforced here by looking up both
/// directions before inserting. An accepted friendship is readable from
/// either side.
use crate::db::{friendship_repo, user_repo};
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::{Friendship, FriendshipStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub requester_username: String,
    pub created_at: DateTime<Utc>,
}

pub struct FriendService {
    pool: PgPool,
}

impl FriendService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn send_request(&self, user_id: Uuid, friend_id: Uuid) -> Result<Friendship> {
        if user_id == friend_id {
            return Err(AppError::InvalidInput(
                "Cannot send a friend request to yourself".into(),
            ));
        }

        user_repo::find_by_id(&self.pool, friend_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if friendship_repo::find_between(&self.pool, user_id, friend_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Friendship already exists".into()));
        }

        let friendship = friendship_repo::create_request(&self.pool, user_id, friend_id)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Friendship already exists".into())
                } else {
                    AppError::from(e)
                }
            })?;
        Ok(friendship)
    }

    /// Accept the pending request `requester` sent to `user`
    pub async fn accept_request(&self, user_id: Uuid, requester_id: Uuid) -> Result<Friendship> {
        let request = friendship_repo::find_pending_request(&self.pool, requester_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend request not found".into()))?;

        let friendship = friendship_repo::set_status(
            &self.pool,
            request.id,
            FriendshipStatus::Accepted.as_str(),
        )
        .await?;
        Ok(friendship)
    }

    /// Reject (delete) the pending request `requester` sent to `user`
    pub async fn reject_request(&self, user_id: Uuid, requester_id: Uuid) -> Result<()> {
        let request = friendship_repo::find_pending_request(&self.pool, requester_id, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Friend request not found".into()))?;

        friendship_repo::delete(&self.pool, request.id).await?;
        Ok(())
    }

    /// Remove an accepted friendship from either side
    pub async fn remove_friend(&self, user_id: Uuid, friend_id: Uuid) -> Result<()> {
        let friendship = friendship_repo::find_between(&self.pool, user_id, friend_id)
            .await?
            .filter(|f| f.status == FriendshipStatus::Accepted.as_str())
            .ok_or_else(|| AppError::NotFound("Friendship not found".into()))?;

        friendship_repo::delete(&self.pool, friendship.id).await?;
        Ok(())
    }

    pub async fn list_friends(&self, user_id: Uuid) -> Result<Vec<FriendInfo>> {
        let friend_ids = friendship_repo::accepted_friend_ids(&self.pool, user_id).await?;

        let mut friends = Vec::with_capacity(friend_ids.len());
        for friend_id in friend_ids {
            if let Some(user) = user_repo::find_by_id(&self.pool, friend_id).await? {
                friends.push(FriendInfo {
                    id: user.id,
                    username: user.username,
                    email: user.email,
                });
            }
        }

        Ok(friends)
    }

    pub async fn list_pending_requests(&self, user_id: Uuid) -> Result<Vec<PendingRequest>> {
        let rows = friendship_repo::list_incoming_pending(&self.pool, user_id).await?;

        Ok(rows
            .into_iter()
            .map(|(friendship, requester_username)| PendingRequest {
                id: friendship.id,
                requester_id: friendship.user_id,
                requester_username,
                created_at: friendship.created_at,
            })
            .collect())
    }
}
