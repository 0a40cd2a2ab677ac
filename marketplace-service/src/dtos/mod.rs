pub mod auth;
pub mod booking;
pub mod catalog;
pub mod payment;

use axum::Json;
use serde::Serialize;

/// Success envelope mirroring the error envelope in shape.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: T,
}

/// Wraps handler output in the `{ "success": true, "data": ... }` envelope.
pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub fn message(text: impl Into<String>) -> Json<ApiResponse<MessageResponse>> {
    ok(MessageResponse {
        message: text.into(),
    })
}
