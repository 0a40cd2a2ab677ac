use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use service_core::error::AppError;

use crate::models::Role;
use crate::services::Claims;
use crate::AppState;

/// Requires a valid bearer token and stashes the claims in request
/// extensions for handlers to extract.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, AppError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::unauthorized("Missing or invalid Authorization header"))?;

    let claims = state
        .tokens
        .validate(token)
        .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Admin gate, layered after [`auth_middleware`].
pub async fn require_admin(req: Request, next: Next) -> Result<impl IntoResponse, AppError> {
    let claims = req
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::unauthorized("Missing or invalid Authorization header"))?;

    if claims.role != Role::Admin {
        return Err(AppError::forbidden("Admin access required"));
    }
    Ok(next.run(req).await)
}

/// Extractor handing handlers the authenticated caller's claims.
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<Claims>()
            .ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("auth claims missing from request extensions"))
            })?
            .clone();
        Ok(AuthUser(claims))
    }
}
