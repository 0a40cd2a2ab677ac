//! Booking lifecycle transitions: confirmation, cancellation, rescheduling
//! and completion, plus agent counter bookkeeping.

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use workflow_tests::{data, error_of, TestApp};

/// Drives a payment through verification and returns the pending booking id.
async fn book(app: &TestApp, token: &str, service_id: Uuid) -> Uuid {
    let order_id = app.create_intent(token, 300.0, "card").await;
    let body = data(app.verify_payment(token, &order_id, service_id, None).await).await;
    Uuid::parse_str(body["booking"]["_id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn confirm_assigns_agent_and_bumps_counter() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("confirm@example.com").await;
    let service = app.seed_service("Sofa cleaning", 300.0).await;
    let agent = app.seed_agent("Ravi").await;
    let admin = app.seed_admin().await;

    let booking_id = book(&app, &token, service.id).await;
    let body = data(
        app.post(
            &format!("/admin/bookings/{}/confirm", booking_id),
            Some(&admin),
            json!({ "agent_id": agent.id }),
        )
        .await,
    )
    .await;

    assert_eq!(body["status"], json!("confirmed"));
    assert_eq!(body["agent"]["id"], json!(agent.id.to_string()));
    assert_eq!(body["agent"]["name"], json!("Ravi"));
    assert_eq!(body["agent"]["phone"], json!(agent.phone));

    let stored = app
        .stores
        .agents
        .find_by_id(agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_bookings, 1);
    assert_eq!(stored.completed_bookings, 0);

    // The assignment notice is queued for the agent.
    let agent_mail = app
        .stores
        .notifications
        .list_for_recipient(&agent.email)
        .await
        .unwrap();
    assert!(!agent_mail.is_empty());
}

#[tokio::test]
async fn confirm_rejects_inactive_agent() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("inactive-agent@example.com").await;
    let service = app.seed_service("Pest control", 300.0).await;
    let agent = app.seed_agent("Meera").await;
    let admin = app.seed_admin().await;

    data(
        app.patch(
            &format!("/admin/agents/{}/active", agent.id),
            Some(&admin),
            json!({ "active": false }),
        )
        .await,
    )
    .await;

    let booking_id = book(&app, &token, service.id).await;
    let response = app
        .post(
            &format!("/admin/bookings/{}/confirm", booking_id),
            Some(&admin),
            json!({ "agent_id": agent.id }),
        )
        .await;
    assert_eq!(error_of(response, 400).await, "Agent is not active");
}

#[tokio::test]
async fn confirm_requires_a_pending_booking() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("double-confirm@example.com").await;
    let service = app.seed_service("AC repair", 300.0).await;
    let agent = app.seed_agent("Sunil").await;
    let admin = app.seed_admin().await;

    let booking_id = book(&app, &token, service.id).await;
    let path = format!("/admin/bookings/{}/confirm", booking_id);
    data(app.post(&path, Some(&admin), json!({ "agent_id": agent.id })).await).await;

    let response = app
        .post(&path, Some(&admin), json!({ "agent_id": agent.id }))
        .await;
    error_of(response, 400).await;

    // The counter only moved for the first confirmation.
    let stored = app
        .stores
        .agents
        .find_by_id(agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_bookings, 1);
}

#[tokio::test]
async fn cancelling_releases_the_assigned_agent() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("cancel@example.com").await;
    let service = app.seed_service("Painting", 300.0).await;
    let agent = app.seed_agent("Kiran").await;
    let admin = app.seed_admin().await;

    let booking_id = book(&app, &token, service.id).await;
    data(
        app.post(
            &format!("/admin/bookings/{}/confirm", booking_id),
            Some(&admin),
            json!({ "agent_id": agent.id }),
        )
        .await,
    )
    .await;

    let body = data(
        app.post(
            &format!("/bookings/{}/cancel", booking_id),
            Some(&token),
            json!({ "reason": "Plans changed" }),
        )
        .await,
    )
    .await;
    assert_eq!(body["status"], json!("cancelled"));
    assert_eq!(body["cancellation_reason"], json!("Plans changed"));
    assert!(body["cancelled_utc"].is_string());

    let stored = app
        .stores
        .agents
        .find_by_id(agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.total_bookings, 0);

    // Already cancelled; a second attempt conflicts.
    let response = app
        .post(
            &format!("/bookings/{}/cancel", booking_id),
            Some(&token),
            json!({}),
        )
        .await;
    error_of(response, 400).await;
}

#[tokio::test]
async fn cancel_defaults_reason_and_is_owner_scoped() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_customer("owner@example.com").await;
    let (intruder, _) = app.register_customer("intruder@example.com").await;
    let service = app.seed_service("Gardening", 300.0).await;

    let booking_id = book(&app, &owner, service.id).await;

    let response = app
        .post(
            &format!("/bookings/{}/cancel", booking_id),
            Some(&intruder),
            json!({}),
        )
        .await;
    assert_eq!(error_of(response, 404).await, "Booking not found");

    let body = data(
        app.post(
            &format!("/bookings/{}/cancel", booking_id),
            Some(&owner),
            json!({}),
        )
        .await,
    )
    .await;
    assert_eq!(body["cancellation_reason"], json!("Cancelled by customer"));
}

#[tokio::test]
async fn reschedule_moves_to_a_future_date() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("reschedule@example.com").await;
    let service = app.seed_service("Carpentry", 300.0).await;

    let booking_id = book(&app, &token, service.id).await;
    let new_date = Utc::now() + Duration::days(14);

    let body = data(
        app.post(
            &format!("/bookings/{}/reschedule", booking_id),
            Some(&token),
            json!({ "scheduled_date": new_date.to_rfc3339() }),
        )
        .await,
    )
    .await;
    let scheduled: DateTime<Utc> = body["scheduled_utc"]
        .as_str()
        .unwrap()
        .parse()
        .expect("scheduled_utc is not RFC 3339");
    assert_eq!(scheduled.timestamp(), new_date.timestamp());

    let response = app
        .post(
            &format!("/bookings/{}/reschedule", booking_id),
            Some(&token),
            json!({ "scheduled_date": (Utc::now() - Duration::hours(1)).to_rfc3339() }),
        )
        .await;
    assert_eq!(
        error_of(response, 400).await,
        "Scheduled date must be in the future"
    );
}

#[tokio::test]
async fn completing_credits_the_agent() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("complete@example.com").await;
    let service = app.seed_service("Electrical", 300.0).await;
    let agent = app.seed_agent("Divya").await;
    let admin = app.seed_admin().await;

    let booking_id = book(&app, &token, service.id).await;
    data(
        app.post(
            &format!("/admin/bookings/{}/confirm", booking_id),
            Some(&admin),
            json!({ "agent_id": agent.id }),
        )
        .await,
    )
    .await;

    let body = data(
        app.post(
            &format!("/admin/bookings/{}/complete", booking_id),
            Some(&admin),
            json!({}),
        )
        .await,
    )
    .await;
    assert_eq!(body["status"], json!("completed"));
    assert!(body["completed_utc"].is_string());

    let stored = app
        .stores
        .agents
        .find_by_id(agent.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.completed_bookings, 1);

    // Completed is terminal.
    for action in ["cancel", "complete"] {
        let response = app
            .post(
                &format!("/admin/bookings/{}/{}", booking_id, action),
                Some(&admin),
                json!({}),
            )
            .await;
        error_of(response, 400).await;
    }
}

#[tokio::test]
async fn pending_bookings_cannot_be_completed() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("skip-confirm@example.com").await;
    let service = app.seed_service("Plumbing", 300.0).await;
    let admin = app.seed_admin().await;

    let booking_id = book(&app, &token, service.id).await;
    let response = app
        .post(
            &format!("/admin/bookings/{}/complete", booking_id),
            Some(&admin),
            json!({}),
        )
        .await;
    error_of(response, 400).await;
}

#[tokio::test]
async fn booking_reads_are_owner_scoped() {
    let app = TestApp::spawn().await;
    let (owner, _) = app.register_customer("reader@example.com").await;
    let (other, _) = app.register_customer("other-reader@example.com").await;
    let service = app.seed_service("Cleaning", 300.0).await;

    let booking_id = book(&app, &owner, service.id).await;

    let body = data(app.get(&format!("/bookings/{}", booking_id), Some(&owner)).await).await;
    assert_eq!(body["_id"], json!(booking_id.to_string()));

    let response = app
        .get(&format!("/bookings/{}", booking_id), Some(&other))
        .await;
    error_of(response, 404).await;

    let listing = data(app.get("/bookings", Some(&other)).await).await;
    assert_eq!(listing.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn malformed_booking_ids_are_rejected() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("badid@example.com").await;

    let response = app.get("/bookings/not-a-uuid", Some(&token)).await;
    assert_eq!(error_of(response, 400).await, "Invalid booking ID format");
}
