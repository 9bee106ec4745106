/// Database access layer
///
/// Narrow query modules, one per entity, shared by the service layer.
/// Conversation and message SQL lives in their services: those queries are
/// coupled to transaction boundaries the Conversation Directory and
/// Messaging Engine own.
pub mod comment_repo;
pub mod friendship_repo;
pub mod like_repo;
pub mod media_repo;
pub mod story_repo;
pub mod user_repo;
