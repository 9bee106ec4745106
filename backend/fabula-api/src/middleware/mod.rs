/// HTTP middleware: JWT authentication and role guards
///
/// `JwtAuth` verifies the bearer token, then checks the account against the
/// database so blocked users are rejected at the boundary, before any
/// handler runs. Handlers receive the caller as an `AuthenticatedUser`
/// extractor; admin-only handlers take `AdminUser` instead.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, FromRequest, HttpMessage,
};
use futures::future::{ready, Ready};
use sqlx::{PgPool, Row};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;

/// Caller identity resolved by `JwtAuth`
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin.as_str()
    }
}

/// Strip the `Bearer ` prefix from an Authorization header value
fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ").map(str::trim).filter(|t| !t.is_empty())
}

pub struct JwtAuth;

impl<S, B> Transform<S, ServiceRequest> for JwtAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = JwtAuthMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct JwtAuthMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let auth_header = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .ok_or_else(|| {
                    Error::from(AppError::Unauthorized("Missing Authorization header".into()))
                })?;

            let token = extract_bearer(auth_header).ok_or_else(|| {
                Error::from(AppError::Unauthorized(
                    "Invalid Authorization header format".into(),
                ))
            })?;

            let token_data = crypto_core::jwt::validate_token(token).map_err(|e| {
                tracing::warn!(error = %e, "JWT validation failed");
                Error::from(AppError::Unauthorized("Invalid token".into()))
            })?;

            if token_data.claims.token_type != "access" {
                return Err(AppError::Unauthorized("Invalid token".into()).into());
            }

            let user_id = Uuid::parse_str(&token_data.claims.sub).map_err(|_| {
                Error::from(AppError::Unauthorized("Invalid token".into()))
            })?;

            // Block check hits the store on every request: token validity
            // must not outlive a moderation decision
            let pool = req
                .app_data::<web::Data<PgPool>>()
                .cloned()
                .ok_or_else(|| Error::from(AppError::Internal("database pool missing".into())))?;

            let row = sqlx::query("SELECT role, is_blocked FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(pool.get_ref())
                .await
                .map_err(|e| Error::from(AppError::from(e)))?
                .ok_or_else(|| Error::from(AppError::Unauthorized("Invalid token".into())))?;

            let is_blocked: bool = row.get("is_blocked");
            if is_blocked {
                return Err(AppError::Forbidden(
                    "Account is blocked. Please contact support.".into(),
                )
                .into());
            }

            req.extensions_mut().insert(AuthenticatedUser {
                id: user_id,
                role: row.get("role"),
            });

            service.call(req).await
        })
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) => ready(Ok(user.clone())),
            None => ready(Err(
                AppError::Unauthorized("User not authenticated".into()).into()
            )),
        }
    }
}

/// Extractor for admin-only handlers; rejects non-admin callers with 403
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

impl FromRequest for AdminUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(
        req: &actix_web::HttpRequest,
        _payload: &mut actix_web::dev::Payload,
    ) -> Self::Future {
        match req.extensions().get::<AuthenticatedUser>() {
            Some(user) if user.is_admin() => ready(Ok(AdminUser(user.clone()))),
            Some(_) => ready(Err(
                AppError::Forbidden("Admin privileges required".into()).into()
            )),
            None => ready(Err(
                AppError::Unauthorized("User not authenticated".into()).into()
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(extract_bearer("bearer abc"), None);
        assert_eq!(extract_bearer("Basic dXNlcg=="), None);
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer(""), None);
    }

    #[test]
    fn test_is_admin() {
        let admin = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: "admin".into(),
        };
        let user = AuthenticatedUser {
            id: Uuid::new_v4(),
            role: "user".into(),
        };
        assert!(admin.is_admin());
        assert!(!user.is_admin());
    }
}
