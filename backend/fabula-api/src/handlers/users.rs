/// Profile handlers
use crate::envelope;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::services::UserService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

pub async fn get_me(pool: web::Data<PgPool>, user: AuthenticatedUser) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let profile = service.get_profile(user.id).await?;

    Ok(envelope::ok("Profile retrieved successfully", profile))
}

pub async fn update_me(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let service = UserService::new((**pool).clone());
    let profile = service
        .update_profile(user.id, req.email.as_deref(), req.username.as_deref())
        .await?;

    Ok(envelope::ok("Profile updated successfully", profile))
}

pub async fn change_password(
    pool: web::Data<PgPool>,
    user: AuthenticatedUser,
    req: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    service
        .change_password(user.id, &req.current_password, &req.new_password)
        .await?;

    Ok(envelope::ok_empty("Password changed successfully"))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}
