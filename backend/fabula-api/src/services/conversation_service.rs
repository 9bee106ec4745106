/// Conversation Directory
///
/// Creates conversations, deduplicates direct (1:1) chats, and manages
/// membership and admin rights. Multi-row mutations run inside a single
/// transaction so partial membership is never visible.
use crate::cache::MembershipCache;
use crate::error::{is_foreign_key_violation, AppError, Result};
use crate::models::{Conversation, ConversationParticipant, Pagination};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantInfo {
    pub id: Uuid,
    pub username: String,
    pub is_admin: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderInfo {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestMessage {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub sender: SenderInfo,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub is_group_chat: bool,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<ParticipantInfo>,
    pub latest_message: Option<LatestMessage>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationPage {
    pub conversations: Vec<ConversationSummary>,
    pub pagination: Pagination,
}

/// Whether `create_conversation` reused an existing direct chat or made a
/// new one; the handler maps this to 200 vs 201.
pub enum CreateOutcome {
    Found(ConversationSummary),
    Created(ConversationSummary),
}

/// Resolve the direct-chat lookup: the single conversation id common to
/// both users' non-group sets. Zero common ids means no direct chat; more
/// than one means the store is in an anomalous state and the caller falls
/// back to creating a fresh conversation.
fn common_direct_conversation(a_ids: &[Uuid], b_ids: &[Uuid]) -> (Option<Uuid>, usize) {
    let b_set: HashSet<&Uuid> = b_ids.iter().collect();
    let common: Vec<Uuid> = a_ids.iter().filter(|id| b_set.contains(id)).copied().collect();
    match common.as_slice() {
        [only] => (Some(*only), 1),
        other => (None, other.len()),
    }
}

pub struct ConversationService {
    pool: PgPool,
    cache: MembershipCache,
}

impl ConversationService {
    pub fn new(pool: PgPool, cache: MembershipCache) -> Self {
        Self { pool, cache }
    }

    pub async fn find_conversation(&self, conversation_id: Uuid) -> Result<Conversation> {
        sqlx::query_as::<_, Conversation>(
            r#"
            SELECT id, is_group_chat, name, last_message_at, created_at, updated_at
            FROM conversations
            WHERE id = $1
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Conversation not found".into()))
    }

    pub async fn is_member(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "SELECT 1 AS one FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.is_some())
    }

    /// Membership check through the short-TTL cache; any cache failure falls
    /// through to the database
    pub async fn is_member_cached(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        if let Some(cached) = self.cache.get(conversation_id, user_id).await {
            return Ok(cached);
        }

        let is_member = self.is_member(conversation_id, user_id).await?;
        self.cache.set(conversation_id, user_id, is_member).await;
        Ok(is_member)
    }

    async fn admin_participant(&self, conversation_id: Uuid, user_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT is_admin
            FROM conversation_participants
            WHERE conversation_id = $1 AND user_id = $2
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<bool, _>("is_admin")).unwrap_or(false))
    }

    /// Non-group conversation ids a user participates in
    async fn direct_conversation_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT cp.conversation_id
            FROM conversation_participants cp
            JOIN conversations c ON c.id = cp.conversation_id
            WHERE cp.user_id = $1 AND c.is_group_chat = FALSE
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("conversation_id")).collect())
    }

    async fn find_direct_conversation(&self, a: Uuid, b: Uuid) -> Result<Option<Uuid>> {
        let a_ids = self.direct_conversation_ids(a).await?;
        let b_ids = self.direct_conversation_ids(b).await?;

        let (found, count) = common_direct_conversation(&a_ids, &b_ids);
        if count > 1 {
            tracing::warn!(
                user_a = %a,
                user_b = %b,
                matches = count,
                "multiple direct conversations found for user pair, treating as not found"
            );
        }
        Ok(found)
    }

    pub async fn create_conversation(
        &self,
        requester_id: Uuid,
        participant_ids: Vec<Uuid>,
        initial_message: Option<String>,
        is_group_chat: bool,
        name: Option<String>,
    ) -> Result<CreateOutcome> {
        if participant_ids.is_empty() {
            return Err(AppError::InvalidInput(
                "At least one participant ID is required".into(),
            ));
        }

        let name = name.filter(|n| !n.trim().is_empty());
        if is_group_chat && name.is_none() {
            return Err(AppError::InvalidInput("Group chats require a name".into()));
        }

        // Direct chats between the same pair are reused, not duplicated.
        // The lookup-then-create sequence is not serialized against other
        // requests; concurrent creations for the same pair can still race
        // (accepted, see DESIGN.md).
        if !is_group_chat && participant_ids.len() == 1 && participant_ids[0] != requester_id {
            if let Some(existing_id) = self
                .find_direct_conversation(requester_id, participant_ids[0])
                .await?
            {
                if let Some(content) = initial_message.as_deref() {
                    self.append_initial_message(existing_id, requester_id, content)
                        .await?;
                }
                let summary = self.get_summary(existing_id).await?;
                return Ok(CreateOutcome::Found(summary));
            }
        }

        // Requester always joins, and joins as the only admin
        let mut members: Vec<Uuid> = vec![requester_id];
        for id in participant_ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        let conversation_id = Uuid::new_v4();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO conversations (id, is_group_chat, name, last_message_at)
            VALUES ($1, $2, $3, NOW())
            "#,
        )
        .bind(conversation_id)
        .bind(is_group_chat)
        .bind(if is_group_chat { name.as_deref() } else { None })
        .execute(&mut *tx)
        .await?;

        for member_id in &members {
            sqlx::query(
                r#"
                INSERT INTO conversation_participants (id, conversation_id, user_id, is_admin)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(conversation_id)
            .bind(member_id)
            .bind(*member_id == requester_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    AppError::InvalidInput(format!("User {member_id} does not exist"))
                } else {
                    e.into()
                }
            })?;
        }

        if let Some(content) = initial_message.as_deref() {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                sqlx::query(
                    r#"
                    INSERT INTO messages (id, conversation_id, sender_id, content, read_by)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(Uuid::new_v4())
                .bind(conversation_id)
                .bind(requester_id)
                .bind(trimmed)
                .bind(serde_json::json!([requester_id]))
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;

        let summary = self.get_summary(conversation_id).await?;
        Ok(CreateOutcome::Created(summary))
    }

    /// Append the initial message to an already-existing direct conversation
    async fn append_initial_message(
        &self,
        conversation_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<()> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO messages (id, conversation_id, sender_id, content, read_by)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(sender_id)
        .bind(trimmed)
        .bind(serde_json::json!([sender_id]))
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE conversations SET last_message_at = NOW(), updated_at = NOW() WHERE id = $1",
        )
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn add_participant(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        new_participant_id: Uuid,
    ) -> Result<ConversationParticipant> {
        let conversation = self.find_conversation(conversation_id).await?;

        if !conversation.is_group_chat {
            return Err(AppError::InvalidOperation(
                "Cannot add participants to direct conversations".into(),
            ));
        }

        if !self.admin_participant(conversation_id, requester_id).await? {
            return Err(AppError::Forbidden("Only admins can add participants".into()));
        }

        if self.is_member(conversation_id, new_participant_id).await? {
            return Err(AppError::Conflict("User is already a participant".into()));
        }

        let participant = sqlx::query_as::<_, ConversationParticipant>(
            r#"
            INSERT INTO conversation_participants (id, conversation_id, user_id, is_admin)
            VALUES ($1, $2, $3, FALSE)
            RETURNING id, conversation_id, user_id, is_admin, last_read_message_id,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(conversation_id)
        .bind(new_participant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::InvalidInput(format!("User {new_participant_id} does not exist"))
            } else {
                AppError::from(e)
            }
        })?;

        self.cache.invalidate(conversation_id, new_participant_id).await;

        Ok(participant)
    }

    /// Self-removal is always allowed; removing someone else requires admin
    pub async fn remove_participant(
        &self,
        conversation_id: Uuid,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<()> {
        let conversation = self.find_conversation(conversation_id).await?;

        if !conversation.is_group_chat {
            return Err(AppError::InvalidOperation(
                "Cannot remove participants from direct conversations".into(),
            ));
        }

        if requester_id != target_id
            && !self.admin_participant(conversation_id, requester_id).await?
        {
            return Err(AppError::Forbidden(
                "Only admins can remove other participants".into(),
            ));
        }

        let affected = sqlx::query(
            "DELETE FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
        )
        .bind(conversation_id)
        .bind(target_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if affected == 0 {
            return Err(AppError::NotFound(
                "Participant not found in conversation".into(),
            ));
        }

        self.cache.invalidate(conversation_id, target_id).await;

        Ok(())
    }

    pub async fn leave_conversation(&self, conversation_id: Uuid, user_id: Uuid) -> Result<()> {
        self.remove_participant(conversation_id, user_id, user_id).await
    }

    /// Delete a conversation with all of its messages and memberships.
    /// Requires the requester to be an admin participant.
    pub async fn delete_conversation(&self, conversation_id: Uuid, requester_id: Uuid) -> Result<()> {
        self.find_conversation(conversation_id).await?;

        if !self.admin_participant(conversation_id, requester_id).await? {
            return Err(AppError::Forbidden(
                "Only admins can delete conversations".into(),
            ));
        }

        let member_ids: Vec<Uuid> = sqlx::query(
            "SELECT user_id FROM conversation_participants WHERE conversation_id = $1",
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|row| row.get("user_id"))
        .collect();

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversation_participants WHERE conversation_id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        for member_id in member_ids {
            self.cache.invalidate(conversation_id, member_id).await;
        }

        Ok(())
    }

    pub async fn get_summary(&self, conversation_id: Uuid) -> Result<ConversationSummary> {
        let conversation = self.find_conversation(conversation_id).await?;
        let mut summaries = self.build_summaries(vec![conversation]).await?;
        summaries
            .pop()
            .ok_or_else(|| AppError::NotFound("Conversation not found".into()))
    }

    pub async fn list_conversations(
        &self,
        user_id: Uuid,
        page: i64,
        limit: i64,
    ) -> Result<ConversationPage> {
        let offset = (page - 1) * limit;

        let total: i64 = sqlx::query(
            "SELECT COUNT(*) AS count FROM conversation_participants WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?
        .get("count");

        let conversations = sqlx::query_as::<_, Conversation>(
            r#"
            SELECT c.id, c.is_group_chat, c.name, c.last_message_at, c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants cp ON cp.conversation_id = c.id
            WHERE cp.user_id = $1
            ORDER BY c.last_message_at DESC, c.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let summaries = self.build_summaries(conversations).await?;

        Ok(ConversationPage {
            conversations: summaries,
            pagination: Pagination::new(total, page, limit),
        })
    }

    /// Assemble participant and latest-message data for a page of
    /// conversations with one query per concern
    async fn build_summaries(
        &self,
        conversations: Vec<Conversation>,
    ) -> Result<Vec<ConversationSummary>> {
        if conversations.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = conversations.iter().map(|c| c.id).collect();

        let participant_rows = sqlx::query(
            r#"
            SELECT cp.conversation_id, u.id AS user_id, u.username, cp.is_admin
            FROM conversation_participants cp
            JOIN users u ON u.id = cp.user_id
            WHERE cp.conversation_id = ANY($1)
            ORDER BY cp.created_at ASC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let latest_rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (m.conversation_id)
                   m.conversation_id, m.id, m.content, m.created_at,
                   u.id AS sender_id, u.username AS sender_username
            FROM messages m
            JOIN users u ON u.id = m.sender_id
            WHERE m.conversation_id = ANY($1)
            ORDER BY m.conversation_id, m.created_at DESC, m.id DESC
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await?;

        let mut participants_by_conversation: std::collections::HashMap<Uuid, Vec<ParticipantInfo>> =
            std::collections::HashMap::new();
        for row in participant_rows {
            let conversation_id: Uuid = row.get("conversation_id");
            participants_by_conversation
                .entry(conversation_id)
                .or_default()
                .push(ParticipantInfo {
                    id: row.get("user_id"),
                    username: row.get("username"),
                    is_admin: row.get("is_admin"),
                });
        }

        let mut latest_by_conversation: std::collections::HashMap<Uuid, LatestMessage> =
            std::collections::HashMap::new();
        for row in latest_rows {
            let conversation_id: Uuid = row.get("conversation_id");
            latest_by_conversation.insert(
                conversation_id,
                LatestMessage {
                    id: row.get("id"),
                    content: row.get("content"),
                    created_at: row.get("created_at"),
                    sender: SenderInfo {
                        id: row.get("sender_id"),
                        username: row.get("sender_username"),
                    },
                },
            );
        }

        Ok(conversations
            .into_iter()
            .map(|c| ConversationSummary {
                id: c.id,
                name: c.name,
                is_group_chat: c.is_group_chat,
                last_message_at: c.last_message_at,
                created_at: c.created_at,
                participants: participants_by_conversation.remove(&c.id).unwrap_or_default(),
                latest_message: latest_by_conversation.remove(&c.id),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_direct_conversation_single_match() {
        let shared = Uuid::new_v4();
        let a = vec![Uuid::new_v4(), shared];
        let b = vec![shared, Uuid::new_v4()];

        let (found, count) = common_direct_conversation(&a, &b);
        assert_eq!(found, Some(shared));
        assert_eq!(count, 1);
    }

    #[test]
    fn test_common_direct_conversation_no_match() {
        let a = vec![Uuid::new_v4()];
        let b = vec![Uuid::new_v4()];

        let (found, count) = common_direct_conversation(&a, &b);
        assert_eq!(found, None);
        assert_eq!(count, 0);
    }

    #[test]
    fn test_common_direct_conversation_anomalous_multi_match() {
        // Two shared non-group conversations is a data-integrity violation;
        // the lookup must report "not found" so the caller creates a fresh one
        let shared1 = Uuid::new_v4();
        let shared2 = Uuid::new_v4();
        let a = vec![shared1, shared2];
        let b = vec![shared2, shared1];

        let (found, count) = common_direct_conversation(&a, &b);
        assert_eq!(found, None);
        assert_eq!(count, 2);
    }

    #[test]
    fn test_common_direct_conversation_empty_sets() {
        let (found, count) = common_direct_conversation(&[], &[]);
        assert_eq!(found, None);
        assert_eq!(count, 0);
    }
}
