pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod payments;
pub mod users;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use service_core::error::AppError;
use uuid::Uuid;

use crate::AppState;

/// Path IDs are parsed by hand so a malformed ID yields the standard error
/// envelope instead of axum's default rejection.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::bad_request(format!("Invalid {} ID format", what)))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service_name,
    }))
}
