pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod services;
pub mod startup;
pub mod store;
pub mod utils;
pub mod workflow;

pub use startup::Application;

use std::sync::Arc;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use service_core::middleware::security_headers::security_headers_middleware;
use service_core::middleware::tracing::{request_id_middleware, REQUEST_ID_HEADER};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use handlers::{admin, auth, bookings, catalog, payments, users};
use middleware::{auth_middleware, require_admin};
use notify::Outbox;
use services::{GoogleVerifier, TokenService};
use store::Stores;
use workflow::BookingWorkflow;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub tokens: TokenService,
    pub google: GoogleVerifier,
    pub workflow: BookingWorkflow,
    pub outbox: Outbox,
}

pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/services", get(catalog::list_services))
        .route("/services/:id", get(catalog::get_service))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/auth/verify-reset-code", post(auth::verify_reset_code))
        .route("/auth/reset-password", post(auth::reset_password));

    let admin_routes = Router::new()
        .route("/bookings", get(admin::list_all_bookings))
        .route("/bookings/:id", get(admin::get_booking))
        .route("/bookings/:id/confirm", post(admin::confirm_booking))
        .route("/bookings/:id/cancel", post(admin::cancel_booking))
        .route("/bookings/:id/complete", post(admin::complete_booking))
        .route("/agents", get(admin::list_agents).post(admin::create_agent))
        .route("/agents/:id/active", patch(admin::set_agent_active))
        .route("/providers/:id/verify", post(admin::verify_provider))
        .layer(from_fn(require_admin));

    let protected = Router::new()
        .route("/users/me", get(users::get_profile).put(users::update_profile))
        .route("/users/change-password", post(users::change_password))
        .route("/services", post(catalog::create_service))
        .route("/services/:id", put(catalog::update_service))
        .route("/services/:id", delete(catalog::delete_service))
        .route("/payments/intent", post(payments::create_intent))
        .route("/payments/verify", post(payments::verify_payment))
        .route("/payments/failure", post(payments::payment_failed))
        .route("/payments", get(payments::list_payments))
        .route("/payments/cards", get(payments::list_cards).post(payments::save_card))
        .route("/payments/wallet", get(payments::get_wallet))
        .route("/payments/points", get(payments::get_points))
        .route("/bookings", get(bookings::list_bookings))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/bookings/:id/reschedule", post(bookings::reschedule_booking))
        .nest("/admin", admin_routes)
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
