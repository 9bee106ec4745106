/// Auth handlers - register, login, token refresh
///
/// These are the only routes outside the JWT middleware.
use crate::envelope;
use crate::error::{AppError, Result};
use crate::services::UserService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

pub async fn register(
    pool: web::Data<PgPool>,
    req: web::Json<RegisterRequest>,
) -> Result<HttpResponse> {
    req.validate()
        .map_err(|e| AppError::InvalidInput(e.to_string()))?;

    let service = UserService::new((**pool).clone());
    let payload = service
        .register(&req.email, &req.username, &req.password)
        .await?;

    Ok(envelope::created("User registered successfully", payload))
}

pub async fn login(pool: web::Data<PgPool>, req: web::Json<LoginRequest>) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let payload = service.login(&req.email, &req.password).await?;

    Ok(envelope::ok("Login successful", payload))
}

pub async fn refresh(
    pool: web::Data<PgPool>,
    req: web::Json<RefreshRequest>,
) -> Result<HttpResponse> {
    let service = UserService::new((**pool).clone());
    let payload = service.refresh(&req.refresh_token).await?;

    Ok(envelope::ok("Token refreshed", payload))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 3, max = 32, message = "username must be 3-32 characters"))]
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}
