//! Conversation Directory and Messaging Engine behavior against a real
//! PostgreSQL. All tests are `#[ignore]`d; run with
//! `DATABASE_URL=... cargo test -- --ignored`.

mod common;

use common::{create_published_story, create_user, test_pool};
use fabula_api::cache::MembershipCache;
use fabula_api::error::AppError;
use fabula_api::services::conversation_service::CreateOutcome;
use fabula_api::services::{ConversationService, LikeService, MessageService};
use sqlx::Row;
use uuid::Uuid;

fn conversation_service(pool: &sqlx::PgPool) -> ConversationService {
    ConversationService::new(pool.clone(), MembershipCache::disabled())
}

fn message_service(pool: &sqlx::PgPool) -> MessageService {
    MessageService::new(pool.clone(), MembershipCache::disabled())
}

fn summary(outcome: CreateOutcome) -> (Uuid, bool) {
    match outcome {
        CreateOutcome::Found(s) => (s.id, false),
        CreateOutcome::Created(s) => (s.id, true),
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn direct_conversation_creation_is_idempotent() {
    let pool = test_pool().await;
    let service = conversation_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;

    let (first_id, first_created) = summary(
        service
            .create_conversation(a, vec![b], None, false, None)
            .await
            .unwrap(),
    );
    assert!(first_created);

    let (second_id, second_created) = summary(
        service
            .create_conversation(a, vec![b], None, false, None)
            .await
            .unwrap(),
    );
    assert!(!second_created, "second create must find the existing conversation");
    assert_eq!(first_id, second_id);

    // Lookup also works from the other side of the pair
    let (third_id, third_created) = summary(
        service
            .create_conversation(b, vec![a], None, false, None)
            .await
            .unwrap(),
    );
    assert!(!third_created);
    assert_eq!(first_id, third_id);
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn create_with_initial_message_seeds_membership_and_read_state() {
    let pool = test_pool().await;
    let service = conversation_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;

    let (conversation_id, created) = summary(
        service
            .create_conversation(a, vec![b], Some("hi".into()), false, None)
            .await
            .unwrap(),
    );
    assert!(created);

    let participants = sqlx::query(
        "SELECT user_id, is_admin FROM conversation_participants WHERE conversation_id = $1",
    )
    .bind(conversation_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(participants.len(), 2);
    for row in &participants {
        let user_id: Uuid = row.get("user_id");
        let is_admin: bool = row.get("is_admin");
        assert_eq!(is_admin, user_id == a, "creator and only the creator is admin");
    }

    let messages = sqlx::query("SELECT content, sender_id, read_by FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .fetch_all(&pool)
        .await
        .unwrap();
    assert_eq!(messages.len(), 1);
    let content: String = messages[0].get("content");
    let sender: Uuid = messages[0].get("sender_id");
    let read_by: serde_json::Value = messages[0].get("read_by");
    assert_eq!(content, "hi");
    assert_eq!(sender, a);
    assert_eq!(read_by, serde_json::json!([a]));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn group_membership_mutation_requires_admin() {
    let pool = test_pool().await;
    let service = conversation_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;
    let c = create_user(&pool, "carol").await;
    let d = create_user(&pool, "dave").await;

    let (group_id, _) = summary(
        service
            .create_conversation(a, vec![b, c], None, true, Some("book club".into()))
            .await
            .unwrap(),
    );

    // Non-admin participant cannot add
    let err = service.add_participant(group_id, b, d).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Non-admin participant cannot remove others
    let err = service.remove_participant(group_id, b, c).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Self-leave never needs admin rights
    service.leave_conversation(group_id, c).await.unwrap();

    // Admin can add; duplicate membership is a conflict
    service.add_participant(group_id, a, d).await.unwrap();
    let err = service.add_participant(group_id, a, d).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn direct_conversations_reject_membership_mutation() {
    let pool = test_pool().await;
    let service = conversation_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;
    let c = create_user(&pool, "carol").await;

    let (direct_id, _) = summary(
        service
            .create_conversation(a, vec![b], None, false, None)
            .await
            .unwrap(),
    );

    let err = service.add_participant(direct_id, a, c).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperation(_)));

    let err = service.remove_participant(direct_id, a, a).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOperation(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn send_message_marks_sender_and_bumps_conversation() {
    let pool = test_pool().await;
    let conversations = conversation_service(&pool);
    let messages = message_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;

    let (conversation_id, _) = summary(
        conversations
            .create_conversation(a, vec![b], None, false, None)
            .await
            .unwrap(),
    );

    let message = messages
        .send_message(conversation_id, a, "  hello there  ")
        .await
        .unwrap();
    assert_eq!(message.content, "hello there");
    assert!(message.read_by.0.contains(&a));

    let row = sqlx::query("SELECT last_message_at FROM conversations WHERE id = $1")
        .bind(conversation_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let last_message_at: chrono::DateTime<chrono::Utc> = row.get("last_message_at");
    assert!(last_message_at >= message.created_at);

    // Empty-after-trim body is invalid input
    let err = messages
        .send_message(conversation_id, a, "   ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidInput(_)));

    // Non-participants cannot send
    let outsider = create_user(&pool, "mallory").await;
    let err = messages
        .send_message(conversation_id, outsider, "hi")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn get_messages_grows_read_state_and_advances_cursor() {
    let pool = test_pool().await;
    let conversations = conversation_service(&pool);
    let messages = message_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;

    let (conversation_id, _) = summary(
        conversations
            .create_conversation(a, vec![b], None, false, None)
            .await
            .unwrap(),
    );

    for i in 0..3 {
        messages
            .send_message(conversation_id, a, &format!("message {i}"))
            .await
            .unwrap();
    }

    let page = messages.get_messages(conversation_id, b, 1, 10).await.unwrap();
    assert_eq!(page.pagination.total, 3);
    assert_eq!(page.messages.len(), 3);

    // Newest first
    assert_eq!(page.messages[0].content, "message 2");

    // Every returned message now carries the reader
    for view in &page.messages {
        assert!(view.read_by.contains(&b));
    }
    let persisted = sqlx::query("SELECT read_by FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .fetch_all(&pool)
        .await
        .unwrap();
    for row in persisted {
        let read_by: serde_json::Value = row.get("read_by");
        assert!(read_by.as_array().unwrap().contains(&serde_json::json!(b)));
    }

    // Cursor points at the newest fetched message
    let row = sqlx::query(
        "SELECT last_read_message_id FROM conversation_participants WHERE conversation_id = $1 AND user_id = $2",
    )
    .bind(conversation_id)
    .bind(b)
    .fetch_one(&pool)
    .await
    .unwrap();
    let cursor: Option<Uuid> = row.get("last_read_message_id");
    assert_eq!(cursor, Some(page.messages[0].id));

    // Non-participants cannot read
    let outsider = create_user(&pool, "mallory").await;
    let err = messages
        .get_messages(conversation_id, outsider, 1, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn delete_conversation_requires_admin_and_leaves_state_intact_on_refusal() {
    let pool = test_pool().await;
    let conversations = conversation_service(&pool);
    let messages = message_service(&pool);
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;

    let (conversation_id, _) = summary(
        conversations
            .create_conversation(a, vec![b], Some("hello".into()), true, Some("pair".into()))
            .await
            .unwrap(),
    );
    messages.send_message(conversation_id, b, "reply").await.unwrap();

    let err = conversations
        .delete_conversation(conversation_id, b)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    // Refusal left everything in place
    let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM messages WHERE conversation_id = $1")
        .bind(conversation_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("count");
    assert_eq!(count, 2);

    // Admin delete removes messages, participants, and the conversation
    conversations.delete_conversation(conversation_id, a).await.unwrap();
    for table in ["messages", "conversation_participants"] {
        let count: i64 = sqlx::query(&format!(
            "SELECT COUNT(*) AS count FROM {table} WHERE conversation_id = $1"
        ))
        .bind(conversation_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("count");
        assert_eq!(count, 0, "{table} should be empty after delete");
    }
}

#[tokio::test]
#[ignore = "requires PostgreSQL (set DATABASE_URL)"]
async fn duplicate_like_conflicts_and_count_is_stable() {
    let pool = test_pool().await;
    let likes = LikeService::new(pool.clone());
    let a = create_user(&pool, "alice").await;
    let b = create_user(&pool, "bob").await;
    let story_id = create_published_story(&pool, b, "a story", chrono::Utc::now()).await;

    likes.like_story(story_id, a).await.unwrap();

    let err = likes.like_story(story_id, a).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let count: i64 = sqlx::query("SELECT COUNT(*) AS count FROM likes WHERE story_id = $1")
        .bind(story_id)
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("count");
    assert_eq!(count, 1);
}
