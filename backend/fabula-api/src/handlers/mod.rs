/// HTTP request handlers
///
/// Thin translation layer: deserialize and validate input, call the service,
/// wrap the result in the response envelope. No business logic lives here.
pub mod admin;
pub mod auth;
pub mod comments;
pub mod conversations;
pub mod feed;
pub mod friends;
pub mod stories;
pub mod users;

use actix_web::web;
use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Normalize pagination input: page >= 1, limit in [1, 100]
pub fn page_params(page: Option<i64>, limit: Option<i64>, default_limit: i64) -> (i64, i64) {
    let page = page.unwrap_or(1).max(1);
    let limit = limit.unwrap_or(default_limit).clamp(1, MAX_PAGE_SIZE);
    (page, limit)
}

/// Route table for everything under `/api/v1` behind the JWT middleware.
/// The `auth` sub-scope is mounted separately, outside the middleware.
pub fn configure_protected(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .service(
                web::resource("/me")
                    .route(web::get().to(users::get_me))
                    .route(web::patch().to(users::update_me)),
            )
            .service(web::resource("/me/password").route(web::post().to(users::change_password))),
    )
    .service(
        web::scope("/stories")
            .service(
                web::resource("")
                    .route(web::get().to(stories::list_stories))
                    .route(web::post().to(stories::create_story)),
            )
            .service(
                web::resource("/{story_id}")
                    .route(web::get().to(stories::get_story))
                    .route(web::patch().to(stories::update_story))
                    .route(web::delete().to(stories::delete_story)),
            )
            .service(
                web::resource("/{story_id}/publish").route(web::post().to(stories::publish_story)),
            )
            .service(
                web::resource("/{story_id}/archive").route(web::post().to(stories::archive_story)),
            )
            .service(
                web::resource("/{story_id}/media").route(web::post().to(stories::attach_media)),
            )
            .service(
                web::resource("/{story_id}/media/{media_id}")
                    .route(web::patch().to(stories::reorder_media))
                    .route(web::delete().to(stories::detach_media)),
            )
            .service(
                web::resource("/{story_id}/like")
                    .route(web::post().to(stories::like_story))
                    .route(web::delete().to(stories::unlike_story)),
            )
            .service(
                web::resource("/{story_id}/comments")
                    .route(web::get().to(comments::get_story_comments))
                    .route(web::post().to(comments::create_comment)),
            ),
    )
    .service(
        web::scope("/comments")
            .service(
                web::resource("/{comment_id}")
                    .route(web::patch().to(comments::update_comment))
                    .route(web::delete().to(comments::delete_comment)),
            )
            .service(
                web::resource("/{comment_id}/replies").route(web::get().to(comments::get_replies)),
            ),
    )
    .service(
        web::scope("/friends")
            .service(web::resource("").route(web::get().to(friends::list_friends)))
            .service(
                web::resource("/requests")
                    .route(web::get().to(friends::list_requests))
                    .route(web::post().to(friends::send_request)),
            )
            .service(
                web::resource("/requests/{user_id}/accept")
                    .route(web::post().to(friends::accept_request)),
            )
            .service(
                web::resource("/requests/{user_id}")
                    .route(web::delete().to(friends::reject_request)),
            )
            .service(web::resource("/{user_id}").route(web::delete().to(friends::remove_friend))),
    )
    .service(
        web::scope("/conversations")
            .service(
                web::resource("")
                    .route(web::get().to(conversations::list_conversations))
                    .route(web::post().to(conversations::create_conversation)),
            )
            .service(
                web::resource("/list")
                    .route(web::post().to(conversations::list_conversations_post)),
            )
            .service(
                web::resource("/{conversation_id}/messages")
                    .route(web::get().to(conversations::get_messages))
                    .route(web::post().to(conversations::send_message)),
            )
            .service(
                web::resource("/{conversation_id}/participants")
                    .route(web::post().to(conversations::add_participant)),
            )
            .service(
                web::resource("/{conversation_id}/participants/{participant_id}")
                    .route(web::delete().to(conversations::remove_participant)),
            )
            .service(
                web::resource("/{conversation_id}")
                    .route(web::delete().to(conversations::delete_conversation)),
            ),
    )
    .service(
        web::scope("/feed")
            .service(web::resource("/getFeed").route(web::post().to(feed::get_feed)))
            .service(web::resource("/getDiscover").route(web::post().to(feed::get_discover))),
    )
    .service(
        web::scope("/admin")
            .service(web::resource("/users").route(web::get().to(admin::list_users)))
            .service(
                web::resource("/users/{user_id}/block").route(web::post().to(admin::block_user)),
            )
            .service(
                web::resource("/users/{user_id}/unblock")
                    .route(web::post().to(admin::unblock_user)),
            )
            .service(web::resource("/users/{user_id}").route(web::delete().to(admin::delete_user)))
            .service(
                web::resource("/stories/{story_id}").route(web::delete().to(admin::delete_story)),
            )
            .service(
                web::resource("/conversations/{conversation_id}")
                    .route(web::delete().to(admin::delete_conversation)),
            ),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_params_defaults() {
        assert_eq!(page_params(None, None, DEFAULT_PAGE_SIZE), (1, 10));
    }

    #[test]
    fn test_page_params_clamps() {
        assert_eq!(page_params(Some(0), Some(0), 10), (1, 1));
        assert_eq!(page_params(Some(-5), Some(1000), 10), (1, MAX_PAGE_SIZE));
        assert_eq!(page_params(Some(3), Some(25), 10), (3, 25));
    }
}
