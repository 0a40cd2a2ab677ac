use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::auth::{ChangePasswordRequest, UpdateProfileRequest};
use crate::dtos::{message, ok, ApiResponse, MessageResponse};
use crate::middleware::AuthUser;
use crate::models::{ProfileChanges, SanitizedAccount};
use crate::utils::{hash_password, verify_password, ValidatedJson};
use crate::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<SanitizedAccount>>, AppError> {
    let account = state
        .stores
        .accounts
        .find_by_id(claims.account_id()?)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;
    Ok(ok(account.sanitized()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<SanitizedAccount>>, AppError> {
    let account_id = claims.account_id()?;

    if let Some(new_email) = &payload.email {
        if let Some(existing) = state.stores.accounts.find_by_email(new_email).await? {
            if existing.id != account_id {
                return Err(AppError::bad_request("Email already registered"));
            }
        }
    }

    let account = state
        .stores
        .accounts
        .update_profile(
            account_id,
            ProfileChanges {
                name: payload.name,
                email: payload.email,
                phone: payload.phone,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;
    Ok(ok(account.sanitized()))
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let account_id = claims.account_id()?;
    let account = state
        .stores
        .accounts
        .find_by_id(account_id)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;

    if !verify_password(&payload.current_password, &account.password_hash) {
        return Err(AppError::unauthorized("Current password is incorrect"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    state
        .stores
        .accounts
        .set_password_hash(account_id, password_hash)
        .await?;

    tracing::info!(account_id = %account_id, "password changed");
    Ok(message("Password changed"))
}
