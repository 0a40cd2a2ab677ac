//! Payment intent creation, verification and booking creation.

use chrono::{Duration, Utc};
use serde_json::json;
use uuid::Uuid;
use workflow_tests::{data, error_of, TestApp, COMPANY_EMAIL};

#[tokio::test]
async fn upi_intents_carry_a_deep_link() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("upi@example.com").await;

    let body = data(
        app.post(
            "/payments/intent",
            Some(&token),
            json!({ "amount": 499.0, "method": "upi" }),
        )
        .await,
    )
    .await;

    let order_id = body["payment"]["order_id"].as_str().unwrap();
    assert!(order_id.starts_with("TXN_"));
    assert_eq!(body["payment"]["status"], json!("pending"));
    assert_eq!(body["payment"]["currency"], json!("INR"));
    let link = body["upi_link"].as_str().unwrap();
    assert!(link.starts_with("upi://pay?pa=merchant@upi"));
    assert!(link.contains("am=499.00"));
}

#[tokio::test]
async fn card_intents_have_no_deep_link() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("card@example.com").await;

    let body = data(
        app.post(
            "/payments/intent",
            Some(&token),
            json!({ "amount": 150.0, "method": "card" }),
        )
        .await,
    )
    .await;
    assert!(body["upi_link"].is_null());
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("zero@example.com").await;

    let response = app
        .post(
            "/payments/intent",
            Some(&token),
            json!({ "amount": 0.0, "method": "card" }),
        )
        .await;
    error_of(response, 400).await;
}

#[tokio::test]
async fn verify_creates_pending_booking_and_awards_points() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_customer("booker@example.com").await;
    let service = app.seed_service("Deep cleaning", 250.0).await;
    let order_id = app.create_intent(&token, 500.0, "upi").await;

    let scheduled = Utc::now() + Duration::days(3);
    let body = data(
        app.verify_payment(&token, &order_id, service.id, Some(scheduled))
            .await,
    )
    .await;

    assert_eq!(body["booking"]["status"], json!("pending"));
    assert_eq!(body["payment"]["status"], json!("completed"));
    assert_eq!(body["points_awarded"], json!(5));
    // The intent is linked back to the booking it paid for.
    assert_eq!(body["payment"]["booking_id"], body["booking"]["_id"]);
    // Line items snapshot catalog pricing.
    assert_eq!(body["booking"]["services"][0]["price"], json!(250.0));
    assert_eq!(body["booking"]["total_amount"], json!(250.0));

    let points = app.stores.payments.get_points(user_id).await.unwrap().unwrap();
    assert_eq!(points.points, 5);

    // Customer and operations mail both queued.
    let booking_id = Uuid::parse_str(body["booking"]["_id"].as_str().unwrap()).unwrap();
    let notifications = app
        .stores
        .notifications
        .list_for_booking(booking_id)
        .await
        .unwrap();
    assert!(notifications.iter().any(|n| n.recipient == "booker@example.com"));
    assert!(notifications.iter().any(|n| n.recipient == COMPANY_EMAIL));
}

#[tokio::test]
async fn repeat_verification_conflicts_and_points_stay_single() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_customer("repeat@example.com").await;
    let service = app.seed_service("Repair visit", 100.0).await;
    let order_id = app.create_intent(&token, 300.0, "card").await;

    data(app.verify_payment(&token, &order_id, service.id, None).await).await;

    let second = app.verify_payment(&token, &order_id, service.id, None).await;
    let error = error_of(second, 400).await;
    assert!(error.to_lowercase().contains("already"), "{}", error);

    let points = app.stores.payments.get_points(user_id).await.unwrap().unwrap();
    assert_eq!(points.points, 3);
    assert_eq!(points.transactions.len(), 1);

    let bookings = app.stores.bookings.list_for_user(user_id).await.unwrap();
    assert_eq!(bookings.len(), 1);
}

#[tokio::test]
async fn amounts_under_one_hundred_award_no_points() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_customer("small@example.com").await;
    let service = app.seed_service("Quick fix", 99.0).await;
    let order_id = app.create_intent(&token, 99.0, "card").await;

    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    assert_eq!(body["points_awarded"], json!(0));
    assert!(app.stores.payments.get_points(user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn verify_rejects_empty_cart_and_past_schedule() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("edge@example.com").await;
    let service = app.seed_service("Gardening", 200.0).await;
    let order_id = app.create_intent(&token, 200.0, "card").await;

    let empty_cart = app
        .post(
            "/payments/verify",
            Some(&token),
            json!({ "order_id": order_id, "services": [] }),
        )
        .await;
    error_of(empty_cart, 400).await;

    let past = app
        .verify_payment(
            &token,
            &order_id,
            service.id,
            Some(Utc::now() - Duration::hours(1)),
        )
        .await;
    error_of(past, 400).await;

    // Both rejections happened before settlement; the intent is still usable.
    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    assert_eq!(body["payment"]["status"], json!("completed"));
}

#[tokio::test]
async fn omitted_schedule_defaults_a_week_out() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("default@example.com").await;
    let service = app.seed_service("Painting", 400.0).await;
    let order_id = app.create_intent(&token, 400.0, "upi").await;

    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    let scheduled: chrono::DateTime<Utc> = body["booking"]["scheduled_utc"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();
    let delta = scheduled - Utc::now();
    assert!(delta > Duration::days(6) && delta < Duration::days(8));
}

#[tokio::test]
async fn orders_are_scoped_to_their_owner() {
    let app = TestApp::spawn().await;
    let (owner_token, _) = app.register_customer("owner@example.com").await;
    let (thief_token, _) = app.register_customer("thief@example.com").await;
    let service = app.seed_service("Moving help", 350.0).await;
    let order_id = app.create_intent(&owner_token, 350.0, "card").await;

    let stolen = app
        .verify_payment(&thief_token, &order_id, service.id, None)
        .await;
    error_of(stolen, 404).await;

    // The rightful owner can still settle it.
    data(
        app.verify_payment(&owner_token, &order_id, service.id, None)
            .await,
    )
    .await;
}

#[tokio::test]
async fn failed_payments_cannot_be_verified() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("failure@example.com").await;
    let service = app.seed_service("Pest control", 300.0).await;
    let order_id = app.create_intent(&token, 300.0, "upi").await;

    data(
        app.post(
            "/payments/failure",
            Some(&token),
            json!({ "order_id": order_id }),
        )
        .await,
    )
    .await;

    let verify = app.verify_payment(&token, &order_id, service.id, None).await;
    error_of(verify, 400).await;

    // Marking failed twice conflicts as well.
    let again = app
        .post(
            "/payments/failure",
            Some(&token),
            json!({ "order_id": order_id }),
        )
        .await;
    error_of(again, 400).await;
}

#[tokio::test]
async fn payment_history_lists_own_intents_only() {
    let app = TestApp::spawn().await;
    let (token_a, _) = app.register_customer("hist-a@example.com").await;
    let (token_b, _) = app.register_customer("hist-b@example.com").await;
    app.create_intent(&token_a, 100.0, "card").await;
    app.create_intent(&token_a, 200.0, "upi").await;
    app.create_intent(&token_b, 300.0, "card").await;

    let history = data(app.get("/payments", Some(&token_a)).await).await;
    assert_eq!(history.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn saved_cards_retain_only_the_last_four_digits() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("cards@example.com").await;

    let card = data(
        app.post(
            "/payments/cards",
            Some(&token),
            json!({
                "card_number": "4111111111111111",
                "card_holder_name": "Ravi Kumar",
                "expiry_month": "09",
                "expiry_year": "2030",
            }),
        )
        .await,
    )
    .await;
    assert_eq!(card["last_four"], json!("1111"));
    assert!(card.get("card_number").is_none());

    let cards = data(app.get("/payments/cards", Some(&token)).await).await;
    assert_eq!(cards.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn wallet_and_points_default_to_empty() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("fresh@example.com").await;

    let wallet = data(app.get("/payments/wallet", Some(&token)).await).await;
    assert_eq!(wallet["balance"], json!(0.0));

    let points = data(app.get("/payments/points", Some(&token)).await).await;
    assert_eq!(points["points"], json!(0));
}

#[tokio::test]
async fn settled_but_unbooked_payments_can_be_retried() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_customer("retry@example.com").await;
    let service = app.seed_service("Sofa shampoo", 200.0).await;
    let order_id = app.create_intent(&token, 200.0, "card").await;

    // A crash between settlement and booking creation leaves the intent
    // completed with no booking link.
    app.stores
        .payments
        .complete_if_pending(&order_id, user_id)
        .await
        .unwrap()
        .expect("settlement should win");

    // The retry resumes at booking creation instead of bouncing off the
    // already-completed intent.
    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    assert_eq!(body["booking"]["status"], json!("pending"));
    assert_eq!(body["payment"]["booking_id"], body["booking"]["_id"]);
    // The settling call owns the reward grant; the resume adds nothing.
    assert_eq!(body["points_awarded"], json!(0));

    let bookings = app.stores.bookings.list_for_user(user_id).await.unwrap();
    assert_eq!(bookings.len(), 1);

    // Once linked, further verifies conflict.
    let again = app.verify_payment(&token, &order_id, service.id, None).await;
    let error = error_of(again, 400).await;
    assert!(error.to_lowercase().contains("already"), "{}", error);
}
