//! The booking record and its snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable snapshot of a purchased catalog line. Copied at creation time;
/// later catalog price changes never affect an existing booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub service_id: Uuid,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn subtotal(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// Assigned-agent identity frozen onto the booking at confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub assigned_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub services: Vec<LineItem>,
    /// Equals the sum of line-item subtotals; immutable once set.
    pub total_amount: f64,
    /// The completed payment intent this booking was created from.
    pub payment_id: Uuid,
    pub status: BookingStatus,
    pub scheduled_utc: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<AgentSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_utc: Option<DateTime<Utc>>,
    pub booked_utc: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: Uuid,
        services: Vec<LineItem>,
        total_amount: f64,
        payment_id: Uuid,
        scheduled_utc: DateTime<Utc>,
        notes: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            services,
            total_amount,
            payment_id,
            status: BookingStatus::Pending,
            scheduled_utc,
            notes,
            agent: None,
            cancellation_reason: None,
            cancelled_utc: None,
            completed_utc: None,
            booked_utc: Utc::now(),
        }
    }
}
