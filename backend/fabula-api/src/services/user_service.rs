/// Account service - registration, login, token refresh, profile
///
/// Credentials are Argon2id hashes (crypto-core); tokens are an RS256
/// access/refresh pair. Blocked accounts are refused before their password
/// is even checked, and again at the auth middleware on every request.
use crate::db::user_repo;
use crate::error::{is_unique_violation, AppError, Result};
use crate::models::{PublicUser, Role};
use crypto_core::{jwt, password};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub user: PublicUser,
    pub tokens: jwt::TokenResponse,
}

pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn register(&self, email: &str, username: &str, raw_password: &str) -> Result<AuthPayload> {
        let email = email.trim().to_lowercase();
        let username = username.trim();

        if user_repo::find_by_email(&self.pool, &email).await?.is_some() {
            return Err(AppError::Conflict(
                "User with this email already exists".into(),
            ));
        }
        if user_repo::find_by_username(&self.pool, username)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("Username is already taken".into()));
        }

        let password_hash = password::hash_password(raw_password)?;

        // The uniqueness pre-checks can race with a concurrent signup; the
        // unique constraints are the authority
        let user = user_repo::create_user(
            &self.pool,
            &email,
            username,
            &password_hash,
            Role::User.as_str(),
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("User with this email or username already exists".into())
            } else {
                AppError::from(e)
            }
        })?;

        let tokens = jwt::generate_token_pair(user.id, &user.email, &user.username, &user.role)?;

        Ok(AuthPayload {
            user: user.into(),
            tokens,
        })
    }

    pub async fn login(&self, email: &str, raw_password: &str) -> Result<AuthPayload> {
        let email = email.trim().to_lowercase();

        let user = user_repo::find_by_email(&self.pool, &email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid credentials".into()))?;

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Account is blocked. Please contact support.".into(),
            ));
        }

        if !password::verify_password(raw_password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        let tokens = jwt::generate_token_pair(user.id, &user.email, &user.username, &user.role)?;

        Ok(AuthPayload {
            user: user.into(),
            tokens,
        })
    }

    /// Exchange a refresh token for a new token pair. The user must still
    /// exist and not be blocked.
    pub async fn refresh(&self, refresh_token: &str) -> Result<AuthPayload> {
        let token_data = jwt::validate_token(refresh_token)
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".into()))?;

        if token_data.claims.token_type != "refresh" {
            return Err(AppError::Unauthorized(
                "Invalid or expired refresh token".into(),
            ));
        }

        let user_id = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token".into()))?;

        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid or expired refresh token".into()))?;

        if user.is_blocked {
            return Err(AppError::Forbidden(
                "Account is blocked. Please contact support.".into(),
            ));
        }

        let tokens = jwt::generate_token_pair(user.id, &user.email, &user.username, &user.role)?;

        Ok(AuthPayload {
            user: user.into(),
            tokens,
        })
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<PublicUser> {
        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        Ok(user.into())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        email: Option<&str>,
        username: Option<&str>,
    ) -> Result<PublicUser> {
        let current = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        let email = email
            .map(|e| e.trim().to_lowercase())
            .unwrap_or_else(|| current.email.clone());
        let username = username.map(str::trim).unwrap_or(&current.username).to_string();

        if email != current.email {
            if let Some(existing) = user_repo::find_by_email(&self.pool, &email).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict(
                        "User with this email already exists".into(),
                    ));
                }
            }
        }
        if username != current.username {
            if let Some(existing) = user_repo::find_by_username(&self.pool, &username).await? {
                if existing.id != user_id {
                    return Err(AppError::Conflict("Username is already taken".into()));
                }
            }
        }

        let user = user_repo::update_profile(&self.pool, user_id, &email, &username).await?;
        Ok(user.into())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<()> {
        let user = user_repo::find_by_id(&self.pool, user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;

        if !password::verify_password(current_password, &user.password_hash)? {
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }

        let password_hash = password::hash_password(new_password)?;
        user_repo::update_password(&self.pool, user_id, &password_hash).await?;

        Ok(())
    }
}
