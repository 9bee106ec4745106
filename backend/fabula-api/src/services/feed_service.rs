/// Feed Assembler
///
/// Two read-only feed views over published stories, each annotated with live
/// engagement counts and a human-relative timestamp:
///
/// - friends feed: the caller's own stories plus accepted friends' stories,
///   sorted by creation time or live like count
/// - discover feed: the trailing week's stories ranked by engagement score
///   (like count + comment count)
///
/// Sorting always tie-breaks on story id so pagination is deterministic when
/// the primary key ties.
use crate::db::{friendship_repo, media_repo};
use crate::error::{AppError, Result};
use crate::models::{Media, Pagination};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedSort {
    CreatedAt,
    LikeCount,
}

impl FeedSort {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value {
            None | Some("createdAt") => Ok(FeedSort::CreatedAt),
            Some("likesCount") => Ok(FeedSort::LikeCount),
            Some(other) => Err(AppError::InvalidInput(format!("invalid sortBy: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(value: Option<&str>) -> Result<Self> {
        match value.map(|v| v.to_ascii_uppercase()).as_deref() {
            None | Some("DESC") => Ok(SortOrder::Desc),
            Some("ASC") => Ok(SortOrder::Asc),
            Some(other) => Err(AppError::InvalidInput(format!("invalid sortOrder: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorInfo {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStory {
    pub id: Uuid,
    pub author: AuthorInfo,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub view_count: i32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub media: Vec<Media>,
    pub like_count: i64,
    pub comment_count: i64,
    pub user_liked: bool,
    pub time_ago: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub stories: Vec<FeedStory>,
    pub pagination: Pagination,
}

/// Relative-time annotation. Under an hour counts minutes (sub-minute ages
/// render as "0 minutes ago"), under a day hours, under a week days, and
/// anything older falls back to the absolute date.
pub fn time_ago(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let diff = now.signed_duration_since(created_at);
    let minutes = diff.num_minutes().max(0);
    let hours = diff.num_hours().max(0);
    let days = diff.num_days().max(0);

    fn plural(n: i64, unit: &str) -> String {
        if n == 1 {
            format!("{n} {unit} ago")
        } else {
            format!("{n} {unit}s ago")
        }
    }

    if days < 1 {
        if hours < 1 {
            plural(minutes, "minute")
        } else {
            plural(hours, "hour")
        }
    } else if days < 7 {
        plural(days, "day")
    } else {
        created_at.format("%Y-%m-%d").to_string()
    }
}

pub struct FeedService {
    pool: PgPool,
}

impl FeedService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get_friends_feed(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
        sort_by: FeedSort,
        sort_order: SortOrder,
    ) -> Result<FeedPage> {
        let mut author_ids = friendship_repo::accepted_friend_ids(&self.pool, user_id).await?;
        author_ids.push(user_id);

        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM stories WHERE user_id = ANY($1) AND status = 'published'",
        )
        .bind(&author_ids)
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let order_clause = match (sort_by, sort_order) {
            (FeedSort::CreatedAt, SortOrder::Desc) => "t.created_at DESC, t.id DESC",
            (FeedSort::CreatedAt, SortOrder::Asc) => "t.created_at ASC, t.id ASC",
            (FeedSort::LikeCount, SortOrder::Desc) => "t.like_count DESC, t.id DESC",
            (FeedSort::LikeCount, SortOrder::Asc) => "t.like_count ASC, t.id ASC",
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT * FROM (
                {}
                WHERE s.user_id = ANY($2) AND s.status = 'published'
            ) t
            ORDER BY {order_clause}
            LIMIT $3 OFFSET $4
            "#,
            annotated_story_select()
        ))
        .bind(user_id)
        .bind(&author_ids)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let stories = self.assemble(rows).await?;

        Ok(FeedPage {
            stories,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Trending view: published stories from the trailing 7 days, ranked by
    /// engagement score. No recency weighting beyond the window cutoff.
    pub async fn get_discover_feed(&self, user_id: Uuid, page: i64, limit: i64) -> Result<FeedPage> {
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS count
            FROM stories
            WHERE status = 'published' AND created_at >= NOW() - INTERVAL '7 days'
            "#,
        )
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let rows = sqlx::query(&format!(
            r#"
            SELECT * FROM (
                {}
                WHERE s.status = 'published' AND s.created_at >= NOW() - INTERVAL '7 days'
            ) t
            ORDER BY (t.like_count + t.comment_count) DESC, t.id DESC
            LIMIT $2 OFFSET $3
            "#,
            annotated_story_select()
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let stories = self.assemble(rows).await?;

        Ok(FeedPage {
            stories,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Attach media and compute relative timestamps for a page of annotated
    /// story rows
    async fn assemble(&self, rows: Vec<sqlx::postgres::PgRow>) -> Result<Vec<FeedStory>> {
        let story_ids: Vec<Uuid> = rows.iter().map(|row| row.get("id")).collect();

        let mut media_by_story: HashMap<Uuid, Vec<Media>> = HashMap::new();
        if !story_ids.is_empty() {
            for media in media_repo::list_for_stories(&self.pool, &story_ids).await? {
                media_by_story.entry(media.story_id).or_default().push(media);
            }
        }

        let now = Utc::now();
        let stories = rows
            .into_iter()
            .map(|row| {
                let id: Uuid = row.get("id");
                let created_at: DateTime<Utc> = row.get("created_at");
                let Json(tags): Json<Vec<String>> = row.get("tags");

                FeedStory {
                    id,
                    author: AuthorInfo {
                        id: row.get("author_id"),
                        username: row.get("author_username"),
                        email: row.get("author_email"),
                    },
                    title: row.get("title"),
                    content: row.get("content"),
                    category: row.get("category"),
                    tags,
                    view_count: row.get("view_count"),
                    published_at: row.get("published_at"),
                    created_at,
                    media: media_by_story.remove(&id).unwrap_or_default(),
                    like_count: row.get("like_count"),
                    comment_count: row.get("comment_count"),
                    user_liked: row.get("user_liked"),
                    time_ago: time_ago(created_at, now),
                }
            })
            .collect();

        Ok(stories)
    }
}

/// Shared SELECT for both feed views. `$1` is always the requesting user,
/// used for the `user_liked` annotation; later parameters belong to each
/// view's WHERE clause and pagination.
fn annotated_story_select() -> &'static str {
    r#"
    SELECT s.id, s.title, s.content, s.category, s.tags, s.view_count,
           s.published_at, s.created_at,
           u.id AS author_id, u.username AS author_username, u.email AS author_email,
           (SELECT COUNT(*) FROM likes l WHERE l.story_id = s.id) AS like_count,
           (SELECT COUNT(*) FROM comments c WHERE c.story_id = s.id) AS comment_count,
           EXISTS(SELECT 1 FROM likes l WHERE l.story_id = s.id AND l.user_id = $1) AS user_liked
    FROM stories s
    JOIN users u ON u.id = s.user_id
    "#
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(now: DateTime<Utc>, ago: Duration) -> String {
        time_ago(now - ago, now)
    }

    #[test]
    fn test_time_ago_minutes() {
        let now = Utc::now();
        assert_eq!(at(now, Duration::seconds(30)), "0 minutes ago");
        assert_eq!(at(now, Duration::minutes(1)), "1 minute ago");
        assert_eq!(at(now, Duration::minutes(45)), "45 minutes ago");
    }

    #[test]
    fn test_time_ago_hours() {
        let now = Utc::now();
        assert_eq!(at(now, Duration::hours(1)), "1 hour ago");
        assert_eq!(at(now, Duration::hours(23)), "23 hours ago");
    }

    #[test]
    fn test_time_ago_days() {
        let now = Utc::now();
        assert_eq!(at(now, Duration::days(1)), "1 day ago");
        assert_eq!(at(now, Duration::days(6)), "6 days ago");
    }

    #[test]
    fn test_time_ago_absolute_date_after_a_week() {
        let now = Utc::now();
        let old = now - Duration::days(10);
        assert_eq!(at(now, Duration::days(10)), old.format("%Y-%m-%d").to_string());
    }

    #[test]
    fn test_time_ago_future_timestamp_clamps_to_zero() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(5), now), "0 minutes ago");
    }

    #[test]
    fn test_feed_sort_parse() {
        assert_eq!(FeedSort::parse(None).unwrap(), FeedSort::CreatedAt);
        assert_eq!(FeedSort::parse(Some("createdAt")).unwrap(), FeedSort::CreatedAt);
        assert_eq!(FeedSort::parse(Some("likesCount")).unwrap(), FeedSort::LikeCount);
        assert!(FeedSort::parse(Some("viewCount")).is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse(None).unwrap(), SortOrder::Desc);
        assert_eq!(SortOrder::parse(Some("asc")).unwrap(), SortOrder::Asc);
        assert_eq!(SortOrder::parse(Some("DESC")).unwrap(), SortOrder::Desc);
        assert!(SortOrder::parse(Some("random")).is_err());
    }
}
