//! Shared fixtures for database-backed integration tests.
//!
//! These tests need a reachable PostgreSQL at `DATABASE_URL` and are marked
//! `#[ignore]` so the default suite runs without infrastructure:
//!
//! ```sh
//! DATABASE_URL=postgres://localhost/fabula_test cargo test -- --ignored
//! ```

use sqlx::PgPool;
use uuid::Uuid;

pub async fn test_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for database-backed tests");
    let pool = PgPool::connect(&url).await.expect("failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

/// Insert a user with unique email/username; returns its id
pub async fn create_user(pool: &PgPool, name: &str) -> Uuid {
    let id = Uuid::new_v4();
    let id_hex = id.simple().to_string();
    let tag = &id_hex[..8];
    sqlx::query(
        r#"
        INSERT INTO users (id, email, username, password_hash, role)
        VALUES ($1, $2, $3, '$argon2id$test', 'user')
        "#,
    )
    .bind(id)
    .bind(format!("{name}-{tag}@example.com"))
    .bind(format!("{name}-{tag}"))
    .execute(pool)
    .await
    .expect("failed to insert test user");
    id
}

pub async fn create_published_story(
    pool: &PgPool,
    author_id: Uuid,
    title: &str,
    created_at: chrono::DateTime<chrono::Utc>,
) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO stories (id, user_id, title, content, status, published_at, created_at)
        VALUES ($1, $2, $3, 'body', 'published', $4, $4)
        "#,
    )
    .bind(id)
    .bind(author_id)
    .bind(title)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("failed to insert test story");
    id
}

pub async fn make_friends(pool: &PgPool, a: Uuid, b: Uuid) {
    sqlx::query(
        r#"
        INSERT INTO friendships (id, user_id, friend_id, status)
        VALUES ($1, $2, $3, 'accepted')
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(a)
    .bind(b)
    .execute(pool)
    .await
    .expect("failed to insert friendship");
}
