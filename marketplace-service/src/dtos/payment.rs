use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{PaymentIntent, PaymentMethod};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateIntentRequest {
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    /// Defaults to INR.
    pub currency: Option<String>,

    pub method: PaymentMethod,

    pub upi_id: Option<String>,

    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub payment: PaymentIntent,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upi_link: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub service_id: Uuid,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub order_id: String,

    pub services: Vec<CartItemRequest>,

    /// Defaults to one week out when omitted.
    pub scheduled_date: Option<DateTime<Utc>>,

    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SaveCardRequest {
    #[validate(length(min = 12, max = 19, message = "Invalid card number"))]
    pub card_number: String,

    #[validate(length(min = 1, message = "Card holder name is required"))]
    pub card_holder_name: String,

    #[validate(length(equal = 2, message = "Expiry month must be MM"))]
    pub expiry_month: String,

    #[validate(length(equal = 4, message = "Expiry year must be YYYY"))]
    pub expiry_year: String,

    #[serde(default)]
    pub is_default: bool,
}
