use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{Booking, PaymentIntent};

#[derive(Debug, Deserialize, Validate)]
pub struct CancelBookingRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RescheduleRequest {
    pub scheduled_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmBookingRequest {
    pub agent_id: Uuid,
}

fn default_page() -> u64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Deserialize)]
pub struct BookingListParams {
    pub status: Option<String>,
    /// Inclusive lower bound on the scheduled date, RFC 3339.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the scheduled date, RFC 3339.
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAgentRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Phone is required"))]
    pub phone: String,

    #[serde(default)]
    pub skills: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetAgentActiveRequest {
    pub active: bool,
}

/// Returned by payment verification: the settled payment plus the booking
/// it produced.
#[derive(Debug, Serialize)]
pub struct VerifiedBookingResponse {
    pub booking: Booking,
    pub payment: PaymentIntent,
    pub points_awarded: i64,
}
