use axum::{extract::State, Json};
use chrono::{Duration, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::dtos::auth::{
    AuthResponse, ForgotPasswordRequest, GoogleAuthRequest, LoginRequest, RegisterRequest,
    ResetPasswordRequest, VerifyResetCodeRequest,
};
use crate::dtos::{message, ok, ApiResponse, MessageResponse};
use crate::models::{Account, ResetCode, Role};
use crate::notify::templates;
use crate::utils::{generate_reset_code, hash_password, verify_password, ValidatedJson};
use crate::AppState;

const RESET_CODE_MINUTES: i64 = 15;

pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<RegisterRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let role = payload.role.unwrap_or(Role::Customer);
    if role == Role::Admin {
        return Err(AppError::forbidden("Admin accounts cannot self-register"));
    }

    if state
        .stores
        .accounts
        .find_by_email(&payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(&payload.password)?;
    let mut account = Account::new(
        payload.name,
        payload.email,
        password_hash,
        payload.phone,
        role,
        payload.location.unwrap_or_default(),
    );
    if role == Role::Provider {
        account.service_categories = payload.service_categories.unwrap_or_default();
        account.experience = payload.experience.unwrap_or_default();
        account.description = payload.description.unwrap_or_default();
        account.availability = payload.availability.unwrap_or_default();
        account.hourly_rate = payload.hourly_rate.unwrap_or_default();
    }

    state.stores.accounts.insert(account.clone()).await?;
    let token = state.tokens.issue_registration_token(account.id, account.role)?;

    tracing::info!(account_id = %account.id, role = %account.role, "account registered");
    Ok(ok(AuthResponse {
        token,
        user: account.sanitized(),
    }))
}

pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let account = state
        .stores
        .accounts
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    if !verify_password(&payload.password, &account.password_hash) {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    let token = state.tokens.issue_login_token(account.id, account.role)?;
    Ok(ok(AuthResponse {
        token,
        user: account.sanitized(),
    }))
}

/// Google sign-in. First sight of an email provisions a customer account
/// with an unguessable local credential.
pub async fn google(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<GoogleAuthRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let profile = state.google.verify(&payload.id_token).await?;

    let account = match state.stores.accounts.find_by_email(&profile.email).await? {
        Some(account) => account,
        None => {
            let password_hash = hash_password(&Uuid::new_v4().to_string())?;
            let mut account = Account::new(
                profile.name.unwrap_or_else(|| profile.email.clone()),
                profile.email,
                password_hash,
                String::new(),
                Role::Customer,
                String::new(),
            );
            account.avatar = profile.picture;
            state.stores.accounts.insert(account.clone()).await?;
            tracing::info!(account_id = %account.id, "account provisioned via google sign-in");
            account
        }
    };

    let token = state.tokens.issue_login_token(account.id, account.role)?;
    Ok(ok(AuthResponse {
        token,
        user: account.sanitized(),
    }))
}

/// Always responds with the same message so the endpoint cannot be used to
/// probe which emails exist.
pub async fn forgot_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    if let Some(account) = state.stores.accounts.find_by_email(&payload.email).await? {
        let code = generate_reset_code();
        state
            .stores
            .accounts
            .set_reset_code(
                &account.email,
                ResetCode {
                    code: code.clone(),
                    expires_utc: Utc::now() + Duration::minutes(RESET_CODE_MINUTES),
                },
            )
            .await?;

        let (subject, body) = templates::reset_code(&account.name, &code);
        if let Err(err) = state.outbox.enqueue(account.email, subject, body, None).await {
            tracing::warn!(error = %err, "failed to enqueue reset code email");
        }
    }

    Ok(message("If the email exists, a reset code has been sent"))
}

/// Lets a client check a reset code before showing the new-password form.
/// Uses the same generic failure message as `reset_password`.
pub async fn verify_reset_code(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<VerifyResetCodeRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let account = state
        .stores
        .accounts
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired code"))?;

    let valid = account
        .reset_code
        .as_ref()
        .map(|rc| rc.code == payload.code && !rc.is_expired(Utc::now()))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::bad_request("Invalid or expired code"));
    }

    Ok(message("Code verified"))
}

pub async fn reset_password(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, AppError> {
    let account = state
        .stores
        .accounts
        .find_by_email(&payload.email)
        .await?
        .ok_or_else(|| AppError::bad_request("Invalid or expired code"))?;

    let valid = account
        .reset_code
        .as_ref()
        .map(|rc| rc.code == payload.code && !rc.is_expired(Utc::now()))
        .unwrap_or(false);
    if !valid {
        return Err(AppError::bad_request("Invalid or expired code"));
    }

    let password_hash = hash_password(&payload.new_password)?;
    state
        .stores
        .accounts
        .set_password_hash(account.id, password_hash)
        .await?;

    let token = state.tokens.issue_login_token(account.id, account.role)?;
    tracing::info!(account_id = %account.id, "password reset");
    Ok(ok(AuthResponse {
        token,
        user: account.sanitized(),
    }))
}
