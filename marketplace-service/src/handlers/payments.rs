use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::booking::VerifiedBookingResponse;
use crate::dtos::payment::{
    CreateIntentRequest, IntentResponse, SaveCardRequest, VerifyPaymentRequest,
};
use crate::dtos::{message, ok, ApiResponse, MessageResponse};
use crate::middleware::AuthUser;
use crate::models::{generate_order_id, PaymentIntent, RewardPoints, SavedCard, Wallet};
use crate::services::upi;
use crate::utils::ValidatedJson;
use crate::workflow::CartLine;
use crate::AppState;

use chrono::Utc;
use uuid::Uuid;

/// Creates a pending payment intent. Link-settled methods additionally get
/// a UPI deep link for the client to open.
pub async fn create_intent(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<CreateIntentRequest>,
) -> Result<Json<ApiResponse<IntentResponse>>, AppError> {
    let order_id = generate_order_id();
    let mut intent = PaymentIntent::new(
        claims.account_id()?,
        order_id,
        payload.amount,
        payload.currency.unwrap_or_else(|| "INR".to_string()),
        payload.method,
        payload.upi_id,
    );
    intent.details = payload.details;

    let upi_link = if payload.method.uses_upi_link() {
        Some(upi::payment_link(
            &state.config.upi,
            &intent.order_id,
            intent.amount,
        )?)
    } else {
        None
    };

    state.stores.payments.insert_intent(intent.clone()).await?;
    tracing::info!(
        order_id = %intent.order_id,
        method = %intent.method.as_str(),
        amount = intent.amount,
        "payment intent created"
    );
    Ok(ok(IntentResponse {
        payment: intent,
        upi_link,
    }))
}

/// Settles the payment and creates the booking in one step.
pub async fn verify_payment(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerifiedBookingResponse>>, AppError> {
    let account = state
        .stores
        .accounts
        .find_by_id(claims.account_id()?)
        .await?
        .ok_or_else(|| AppError::unauthorized("Account no longer exists"))?;

    let cart = payload
        .services
        .into_iter()
        .map(|item| CartLine {
            service_id: item.service_id,
            quantity: item.quantity,
        })
        .collect();

    let outcome = state
        .workflow
        .verify_and_book(
            &account,
            &payload.order_id,
            cart,
            payload.scheduled_date,
            payload.notes.unwrap_or_default(),
        )
        .await?;

    Ok(ok(VerifiedBookingResponse {
        booking: outcome.booking,
        payment: outcome.payment,
        points_awarded: outcome.points_awarded,
    }))
}

#[derive(Debug, serde::Deserialize, validator::Validate)]
pub struct PaymentFailureRequest {
    #[validate(length(min = 1, message = "Order ID is required"))]
    pub order_id: String,
}

/// Records a client-reported gateway failure on the pending intent.
pub async fn payment_failed(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<PaymentFailureRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    let user_id = claims.account_id()?;
    if !state
        .stores
        .payments
        .mark_failed(&payload.order_id, user_id)
        .await?
    {
        return Err(AppError::StateConflict(
            "Payment is not pending".to_string(),
        ));
    }
    tracing::info!(order_id = %payload.order_id, "payment marked failed");
    Ok(message("Payment marked failed"))
}

pub async fn list_payments(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<PaymentIntent>>>, AppError> {
    let payments = state
        .stores
        .payments
        .list_for_user(claims.account_id()?)
        .await?;
    Ok(ok(payments))
}

pub async fn save_card(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    ValidatedJson(payload): ValidatedJson<SaveCardRequest>,
) -> Result<Json<ApiResponse<SavedCard>>, AppError> {
    if !payload.card_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::bad_request("Invalid card number"));
    }

    // Only the last four digits are retained.
    let last_four = payload
        .card_number
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    let card = SavedCard {
        id: Uuid::new_v4(),
        user_id: claims.account_id()?,
        last_four,
        card_holder_name: payload.card_holder_name,
        expiry_month: payload.expiry_month,
        expiry_year: payload.expiry_year,
        is_default: payload.is_default,
        created_utc: Utc::now(),
    };
    state.stores.payments.save_card(card.clone()).await?;
    Ok(ok(card))
}

pub async fn list_cards(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Vec<SavedCard>>>, AppError> {
    let cards = state
        .stores
        .payments
        .list_cards(claims.account_id()?)
        .await?;
    Ok(ok(cards))
}

pub async fn get_wallet(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<Wallet>>, AppError> {
    let user_id = claims.account_id()?;
    let wallet = state
        .stores
        .payments
        .get_wallet(user_id)
        .await?
        .unwrap_or(Wallet {
            id: Uuid::new_v4(),
            user_id,
            balance: 0.0,
            transactions: Vec::new(),
        });
    Ok(ok(wallet))
}

pub async fn get_points(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<ApiResponse<RewardPoints>>, AppError> {
    let user_id = claims.account_id()?;
    let points = state
        .stores
        .payments
        .get_points(user_id)
        .await?
        .unwrap_or(RewardPoints {
            id: Uuid::new_v4(),
            user_id,
            points: 0,
            transactions: Vec::new(),
        });
    Ok(ok(points))
}
