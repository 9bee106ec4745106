/// Fabula API Library
///
/// Social-content backend: stories with media, comments, likes, friendships,
/// direct/group messaging, friend and discover feeds, and admin moderation.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and the route table
/// - `models`: row structs and value enums
/// - `services`: business logic layer (owns transactions and invariants)
/// - `db`: database access layer and repositories
/// - `cache`: Redis-backed conversation-membership cache
/// - `middleware`: JWT authentication and role guards
/// - `envelope`: `{status, msg, data}` response wrapper
/// - `error`: error types and HTTP translation
/// - `config`: configuration management
pub mod cache;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
