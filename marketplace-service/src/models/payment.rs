//! Payment ledger records: intents, saved cards, wallet and reward points.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    Upi,
    Wallet,
    Qr,
    PayLater,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Qr => "qr",
            PaymentMethod::PayLater => "pay_later",
        }
    }

    /// Methods settled through a UPI deep link.
    pub fn uses_upi_link(&self) -> bool {
        matches!(
            self,
            PaymentMethod::Upi | PaymentMethod::Qr | PaymentMethod::PayLater
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

/// One attempted payment. Transitions pending -> completed at most once;
/// only a completed intent may back a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntent {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Client-facing transaction identifier, unique across the ledger.
    pub order_id: String,
    pub amount: f64,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_id: Option<String>,
    /// Opaque gateway metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl PaymentIntent {
    pub fn new(
        user_id: Uuid,
        order_id: String,
        amount: f64,
        currency: String,
        method: PaymentMethod,
        upi_id: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            order_id,
            amount,
            currency,
            method,
            status: PaymentStatus::Pending,
            booking_id: None,
            upi_id,
            details: None,
            created_utc: now,
            updated_utc: now,
        }
    }

    /// Reward points accrued when this intent completes: one point per 100
    /// currency units, floored.
    pub fn reward_points(&self) -> i64 {
        (self.amount / 100.0).floor() as i64
    }
}

/// Generate a client-facing transaction identifier. Monotonic-time based;
/// the unique index on `order_id` backs collision detection.
pub fn generate_order_id() -> String {
    use rand::Rng;
    let millis = Utc::now().timestamp_millis();
    let salt: u16 = rand::thread_rng().gen_range(0..1000);
    format!("TXN_{millis}_{salt:03}")
}

/// Stored card metadata. Only the last four PAN digits survive intake;
/// handlers expose this through a view that omits nothing sensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedCard {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub last_four: String,
    pub card_holder_name: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub is_default: bool,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletEntry {
    pub kind: String,
    pub amount: f64,
    pub description: String,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub balance: f64,
    #[serde(default)]
    pub transactions: Vec<WalletEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsEntry {
    /// "earn" or "redeem".
    pub kind: String,
    pub points: i64,
    pub description: String,
    pub created_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardPoints {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: i64,
    #[serde(default)]
    pub transactions: Vec<PointsEntry>,
}
