//! Admin-only operations: booking oversight, agent roster management and
//! provider verification. All routes here sit behind the admin gate.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::booking::{
    BookingListParams, CancelBookingRequest, ConfirmBookingRequest, CreateAgentRequest,
    SetAgentActiveRequest,
};
use crate::dtos::{message, ok, ApiResponse, MessageResponse};
use crate::models::{Agent, Booking, BookingStatus, Role};
use crate::store::BookingFilter;
use crate::utils::ValidatedJson;
use crate::AppState;

use super::parse_id;

pub async fn list_all_bookings(
    State(state): State<AppState>,
    Query(params): Query<BookingListParams>,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    if let Some(status) = &params.status {
        if BookingStatus::parse(status).is_none() {
            return Err(AppError::bad_request("Unknown booking status"));
        }
    }
    if params.page == 0 || params.limit <= 0 {
        return Err(AppError::bad_request("Page and limit must be positive"));
    }
    let bookings = state
        .stores
        .bookings
        .list_all(BookingFilter {
            status: params.status,
            from_utc: params.start_date,
            to_utc: params.end_date,
            skip: (params.page - 1) * params.limit as u64,
            limit: params.limit,
        })
        .await?;
    Ok(ok(bookings))
}

/// Unscoped single-booking read; the customer-facing route only returns
/// the caller's own bookings.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .stores
        .bookings
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    Ok(ok(booking))
}

pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<ConfirmBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state.workflow.confirm(id, payload.agent_id).await?;
    Ok(ok(booking))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CancelBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .workflow
        .cancel(
            id,
            None,
            payload
                .reason
                .unwrap_or_else(|| "Cancelled by admin".to_string()),
        )
        .await?;
    Ok(ok(booking))
}

pub async fn complete_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state.workflow.complete(id).await?;
    Ok(ok(booking))
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct AgentListParams {
    #[serde(default)]
    pub active_only: bool,
    /// Narrows candidates to agents skilled in this service's category.
    pub service_id: Option<String>,
}

/// Candidates come back best-first so the top of the list is the default
/// assignment choice.
pub async fn list_agents(
    State(state): State<AppState>,
    Query(params): Query<AgentListParams>,
) -> Result<Json<ApiResponse<Vec<Agent>>>, AppError> {
    let skill = match &params.service_id {
        Some(raw) => {
            let id = parse_id(raw, "service")?;
            let service = state
                .stores
                .catalog
                .find_by_id(id)
                .await?
                .ok_or_else(|| AppError::not_found("Service not found"))?;
            Some(service.category)
        }
        None => None,
    };
    let agents = state
        .stores
        .agents
        .list(params.active_only, skill.as_deref())
        .await?;
    Ok(ok(agents))
}

pub async fn create_agent(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateAgentRequest>,
) -> Result<Json<ApiResponse<Agent>>, AppError> {
    let agent = Agent::new(payload.name, payload.email, payload.phone, payload.skills);
    state.stores.agents.insert(agent.clone()).await?;
    tracing::info!(agent_id = %agent.id, "agent added to roster");
    Ok(ok(agent))
}

pub async fn set_agent_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<SetAgentActiveRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let id = parse_id(&id, "agent")?;
    if !state.stores.agents.set_active(id, payload.active).await? {
        return Err(AppError::not_found("Agent not found"));
    }
    Ok(message(if payload.active {
        "Agent activated"
    } else {
        "Agent deactivated"
    }))
}

/// Flips a provider account to verified so its listings surface.
pub async fn verify_provider(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let id = parse_id(&id, "account")?;
    let account = state
        .stores
        .accounts
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("Account not found"))?;
    if account.role != Role::Provider {
        return Err(AppError::bad_request("Account is not a provider"));
    }
    if account.is_verified {
        return Err(AppError::StateConflict(
            "Provider is already verified".to_string(),
        ));
    }
    state.stores.accounts.mark_verified(id).await?;
    tracing::info!(account_id = %id, "provider verified");
    Ok(message("Provider verified"))
}
