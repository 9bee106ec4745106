/// Conversation and messaging handlers
use crate::cache::MembershipCache;
use crate::envelope;
use crate::error::Result;
use crate::handlers::{page_params, PageQuery, DEFAULT_PAGE_SIZE};
use crate::middleware::AuthenticatedUser;
use crate::services::conversation_service::CreateOutcome;
use crate::services::{ConversationService, MessageService};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

pub async fn create_conversation(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    req: web::Json<CreateConversationRequest>,
) -> Result<HttpResponse> {
    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    let outcome = service
        .create_conversation(
            user.id,
            req.participant_ids.clone(),
            req.initial_message.clone(),
            req.is_group_chat.unwrap_or(false),
            req.name.clone(),
        )
        .await?;

    match outcome {
        CreateOutcome::Found(conversation) => {
            Ok(envelope::ok("Existing conversation found", conversation))
        }
        CreateOutcome::Created(conversation) => Ok(envelope::created(
            "Conversation created successfully",
            conversation,
        )),
    }
}

pub async fn list_conversations(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);

    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    let conversations = service.list_conversations(user.id, page, limit).await?;

    Ok(envelope::ok(
        "Conversations retrieved successfully",
        conversations,
    ))
}

/// Same listing, parameters in the JSON body
pub async fn list_conversations_post(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    req: web::Json<PageBody>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(req.page, req.limit, DEFAULT_PAGE_SIZE);

    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    let conversations = service.list_conversations(user.id, page, limit).await?;

    Ok(envelope::ok(
        "Conversations retrieved successfully",
        conversations,
    ))
}

pub async fn send_message(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    conversation_id: web::Path<Uuid>,
    req: web::Json<SendMessageRequest>,
) -> Result<HttpResponse> {
    let service = MessageService::new((**pool).clone(), (**cache).clone());
    let message = service
        .send_message(*conversation_id, user.id, &req.content)
        .await?;

    Ok(envelope::created("Message sent successfully", message))
}

pub async fn get_messages(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    conversation_id: web::Path<Uuid>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (page, limit) = page_params(query.page, query.limit, 20);

    let service = MessageService::new((**pool).clone(), (**cache).clone());
    let messages = service
        .get_messages(*conversation_id, user.id, page, limit)
        .await?;

    Ok(envelope::ok("Messages retrieved successfully", messages))
}

pub async fn add_participant(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    conversation_id: web::Path<Uuid>,
    req: web::Json<AddParticipantRequest>,
) -> Result<HttpResponse> {
    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    let participant = service
        .add_participant(*conversation_id, user.id, req.participant_id)
        .await?;

    Ok(envelope::created("Participant added successfully", participant))
}

pub async fn remove_participant(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse> {
    let (conversation_id, participant_id) = *path;

    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    service
        .remove_participant(conversation_id, user.id, participant_id)
        .await?;

    Ok(envelope::ok_empty("Participant removed successfully"))
}

pub async fn delete_conversation(
    pool: web::Data<PgPool>,
    cache: web::Data<MembershipCache>,
    user: AuthenticatedUser,
    conversation_id: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let service = ConversationService::new((**pool).clone(), (**cache).clone());
    service.delete_conversation(*conversation_id, user.id).await?;

    Ok(envelope::ok_empty("Conversation deleted successfully"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateConversationRequest {
    pub participant_ids: Vec<Uuid>,
    pub initial_message: Option<String>,
    pub is_group_chat: Option<bool>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddParticipantRequest {
    pub participant_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageBody {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}
