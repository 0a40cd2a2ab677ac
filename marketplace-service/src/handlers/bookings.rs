use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::dtos::booking::{CancelBookingRequest, RescheduleRequest};
use crate::dtos::{ok, ApiResponse};
use crate::middleware::AuthUser;
use crate::models::Booking;
use crate::utils::ValidatedJson;
use crate::AppState;

use super::parse_id;

pub async fn list_bookings(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<Booking>>>, AppError> {
    let bookings = state
        .stores
        .bookings
        .list_for_user(claims.account_id()?)
        .await?;
    Ok(ok(bookings))
}

pub async fn get_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .stores
        .bookings
        .find_for_user(id, claims.account_id()?)
        .await?
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
    Ok(ok(booking))
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<CancelBookingRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .workflow
        .cancel(
            id,
            Some(claims.account_id()?),
            payload
                .reason
                .unwrap_or_else(|| "Cancelled by customer".to_string()),
        )
        .await?;
    Ok(ok(booking))
}

pub async fn reschedule_booking(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Path(id): Path<String>,
    ValidatedJson(payload): ValidatedJson<RescheduleRequest>,
) -> Result<Json<ApiResponse<Booking>>, AppError> {
    let id = parse_id(&id, "booking")?;
    let booking = state
        .workflow
        .reschedule(id, claims.account_id()?, payload.scheduled_date)
        .await?;
    Ok(ok(booking))
}
