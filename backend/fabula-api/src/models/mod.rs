/// Data models for the Fabula API
///
/// Row structs map 1:1 onto tables (see `migrations/0001_init.sql`) and
/// serialize in the camelCase shape the HTTP API exposes. String-typed
/// columns with a closed value set get a companion enum used for validation
/// at the write boundary; rows keep the raw string.
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl TryFrom<&str> for Role {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(AppError::InvalidInput("invalid role".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryStatus {
    Draft,
    Published,
    Archived,
}

impl StoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoryStatus::Draft => "draft",
            StoryStatus::Published => "published",
            StoryStatus::Archived => "archived",
        }
    }
}

impl TryFrom<&str> for StoryStatus {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "draft" => Ok(StoryStatus::Draft),
            "published" => Ok(StoryStatus::Published),
            "archived" => Ok(StoryStatus::Archived),
            _ => Err(AppError::InvalidInput("invalid story status".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

impl TryFrom<&str> for MediaKind {
    type Error = AppError;
    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s {
            "image" => Ok(MediaKind::Image),
            "audio" => Ok(MediaKind::Audio),
            "video" => Ok(MediaKind::Video),
            _ => Err(AppError::InvalidInput("invalid media kind".into())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FriendshipStatus {
    Pending,
    Accepted,
    Blocked,
}

impl FriendshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendshipStatus::Pending => "pending",
            FriendshipStatus::Accepted => "accepted",
            FriendshipStatus::Blocked => "blocked",
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User shape safe to return to any caller
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        PublicUser {
            id: u.id,
            email: u.email,
            username: u.username,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub status: String,
    pub category: Option<String>,
    pub tags: Json<Vec<String>>,
    pub view_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Uuid,
    pub story_id: Uuid,
    pub kind: String,
    pub url: String,
    pub position: i32,
    pub metadata: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub id: Uuid,
    pub story_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Friendship {
    pub id: Uuid,
    pub user_id: Uuid,
    pub friend_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Uuid,
    pub is_group_chat: bool,
    pub name: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationParticipant {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub user_id: Uuid,
    pub is_admin: bool,
    pub last_read_message_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: Uuid,
    pub conversation_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub read_by: Json<Vec<Uuid>>,
    pub created_at: DateTime<Utc>,
}

/// Pagination block returned by every list endpoint
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

impl Pagination {
    /// `pages = ceil(total / limit)`; `limit` must be positive (clamped by
    /// the handlers before reaching here)
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Pagination { total, page, pages }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_story_status_round_trip() {
        for status in [StoryStatus::Draft, StoryStatus::Published, StoryStatus::Archived] {
            assert_eq!(StoryStatus::try_from(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_story_status_rejects_unknown() {
        assert!(StoryStatus::try_from("deleted").is_err());
    }

    #[test]
    fn test_media_kind_round_trip() {
        for kind in [MediaKind::Image, MediaKind::Audio, MediaKind::Video] {
            assert_eq!(MediaKind::try_from(kind.as_str()).unwrap(), kind);
        }
        assert!(MediaKind::try_from("gif").is_err());
    }

    #[test]
    fn test_role_round_trip() {
        assert_eq!(Role::try_from("admin").unwrap(), Role::Admin);
        assert_eq!(Role::try_from("user").unwrap(), Role::User);
        assert!(Role::try_from("superuser").is_err());
    }

    #[test]
    fn test_pagination_ceiling() {
        assert_eq!(Pagination::new(0, 1, 10).pages, 0);
        assert_eq!(Pagination::new(1, 1, 10).pages, 1);
        assert_eq!(Pagination::new(10, 1, 10).pages, 1);
        assert_eq!(Pagination::new(11, 1, 10).pages, 2);
        assert_eq!(Pagination::new(21, 3, 10).pages, 3);
    }

    #[test]
    fn test_public_user_omits_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            username: "ab".into(),
            password_hash: "$argon2id$...".into(),
            role: "user".into(),
            is_blocked: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(value.get("passwordHash").is_none());
        assert!(value.get("password_hash").is_none());
    }
}
