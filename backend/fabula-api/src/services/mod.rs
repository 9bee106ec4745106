/// Business logic layer
///
/// Services own transactions and the domain invariants; handlers above them
/// only translate shapes, repositories below them only run queries.
pub mod admin_service;
pub mod comment_service;
pub mod conversation_service;
pub mod feed_service;
pub mod friend_service;
pub mod like_service;
pub mod message_service;
pub mod story_service;
pub mod user_service;

pub use admin_service::AdminService;
pub use comment_service::CommentService;
pub use conversation_service::ConversationService;
pub use feed_service::FeedService;
pub use friend_service::FriendService;
pub use like_service::LikeService;
pub use message_service::MessageService;
pub use story_service::StoryService;
pub use user_service::UserService;
