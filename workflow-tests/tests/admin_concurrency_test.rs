//! Admin surface and race behavior: concurrent settlement and confirmation,
//! agent roster management, provider verification and booking oversight.

use chrono::{Duration, SecondsFormat, Utc};
use serde_json::json;
use uuid::Uuid;
use workflow_tests::{data, error_of, TestApp};

use marketplace_service::models::Agent;
use marketplace_service::workflow::CartLine;

#[tokio::test]
async fn concurrent_verification_settles_exactly_once() {
    let app = TestApp::spawn().await;
    let (token, user_id) = app.register_customer("racer@example.com").await;
    let service = app.seed_service("Deep cleaning", 400.0).await;
    let order_id = app.create_intent(&token, 400.0, "upi").await;

    let account = app
        .stores
        .accounts
        .find_by_id(user_id)
        .await
        .unwrap()
        .unwrap();
    let cart = || {
        vec![CartLine {
            service_id: service.id,
            quantity: 1,
        }]
    };

    let (first, second) = tokio::join!(
        app.workflow
            .verify_and_book(&account, &order_id, cart(), None, String::new()),
        app.workflow
            .verify_and_book(&account, &order_id, cart(), None, String::new()),
    );

    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one verification must settle");

    let bookings = app.stores.bookings.list_for_user(user_id).await.unwrap();
    assert_eq!(bookings.len(), 1);

    let points = app
        .stores
        .payments
        .get_points(user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(points.points, 4);
    assert_eq!(points.transactions.len(), 1);
}

#[tokio::test]
async fn concurrent_confirmation_assigns_exactly_one_agent() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("race-confirm@example.com").await;
    let service = app.seed_service("Pest control", 300.0).await;
    let first_agent = app.seed_agent("Arun").await;
    let second_agent = app.seed_agent("Bela").await;

    let order_id = app.create_intent(&token, 300.0, "card").await;
    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    let booking_id = Uuid::parse_str(body["booking"]["_id"].as_str().unwrap()).unwrap();

    let (first, second) = tokio::join!(
        app.workflow.confirm(booking_id, first_agent.id),
        app.workflow.confirm(booking_id, second_agent.id),
    );
    let winners = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one confirmation must win");

    let booking = app
        .stores
        .bookings
        .find_by_id(booking_id)
        .await
        .unwrap()
        .unwrap();
    let assigned = booking.agent.expect("confirmed booking has an agent").id;

    let mut total = 0;
    for agent_id in [first_agent.id, second_agent.id] {
        let agent = app.stores.agents.find_by_id(agent_id).await.unwrap().unwrap();
        total += agent.total_bookings;
        if agent_id == assigned {
            assert_eq!(agent.total_bookings, 1);
        }
    }
    assert_eq!(total, 1);
}

#[tokio::test]
async fn agents_are_created_and_filtered_through_the_api() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let created = data(
        app.post(
            "/admin/agents",
            Some(&admin),
            json!({
                "name": "Farah",
                "email": "farah@agents.example.com",
                "phone": "+917000000001",
                "skills": ["plumbing", "electrical"],
            }),
        )
        .await,
    )
    .await;
    assert_eq!(created["is_active"], json!(true));
    assert_eq!(created["total_bookings"], json!(0));
    let agent_id = created["_id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/admin/agents",
            Some(&admin),
            json!({ "name": "Nameless", "email": "not-an-email", "phone": "+917000000002" }),
        )
        .await;
    error_of(response, 400).await;

    data(
        app.patch(
            &format!("/admin/agents/{}/active", agent_id),
            Some(&admin),
            json!({ "active": false }),
        )
        .await,
    )
    .await;

    let active = data(app.get("/admin/agents?active_only=true", Some(&admin)).await).await;
    assert!(active
        .as_array()
        .unwrap()
        .iter()
        .all(|a| a["_id"] != json!(agent_id)));

    let everyone = data(app.get("/admin/agents", Some(&admin)).await).await;
    assert!(everyone
        .as_array()
        .unwrap()
        .iter()
        .any(|a| a["_id"] == json!(agent_id)));
}

#[tokio::test]
async fn providers_start_unverified_until_an_admin_flips_them() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;

    let body = data(
        app.post(
            "/auth/register",
            None,
            json!({
                "name": "Pro Cleaner",
                "email": "pro@example.com",
                "password": "provider-pass-1",
                "phone": "+916000000001",
                "role": "provider",
                "service_categories": ["cleaning"],
            }),
        )
        .await,
    )
    .await;
    assert_eq!(body["user"]["is_verified"], json!(false));
    let provider_id = body["user"]["id"].as_str().unwrap().to_string();

    data(
        app.post(
            &format!("/admin/providers/{}/verify", provider_id),
            Some(&admin),
            json!({}),
        )
        .await,
    )
    .await;

    let response = app
        .post(
            &format!("/admin/providers/{}/verify", provider_id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(
        error_of(response, 400).await,
        "Provider is already verified"
    );
}

#[tokio::test]
async fn verify_provider_rejects_non_provider_accounts() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;
    let (_, customer_id) = app.register_customer("plain@example.com").await;

    let response = app
        .post(
            &format!("/admin/providers/{}/verify", customer_id),
            Some(&admin),
            json!({}),
        )
        .await;
    assert_eq!(error_of(response, 400).await, "Account is not a provider");
}

#[tokio::test]
async fn admin_booking_listing_filters_by_status() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("oversight@example.com").await;
    let service = app.seed_service("Window cleaning", 200.0).await;
    let admin = app.seed_admin().await;

    let order_id = app.create_intent(&token, 200.0, "card").await;
    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    let booking_id = body["booking"]["_id"].as_str().unwrap().to_string();

    let pending = data(app.get("/admin/bookings?status=pending", Some(&admin)).await).await;
    assert!(pending
        .as_array()
        .unwrap()
        .iter()
        .any(|b| b["_id"] == json!(booking_id)));

    let completed = data(app.get("/admin/bookings?status=completed", Some(&admin)).await).await;
    assert!(completed.as_array().unwrap().is_empty());

    let response = app.get("/admin/bookings?status=bogus", Some(&admin)).await;
    assert_eq!(error_of(response, 400).await, "Unknown booking status");
}

#[tokio::test]
async fn admin_can_cancel_any_booking() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("overruled@example.com").await;
    let service = app.seed_service("Tiling", 350.0).await;
    let admin = app.seed_admin().await;

    let order_id = app.create_intent(&token, 350.0, "card").await;
    let body = data(app.verify_payment(&token, &order_id, service.id, None).await).await;
    let booking_id = body["booking"]["_id"].as_str().unwrap().to_string();

    // Admins can read any booking regardless of owner.
    let seen = data(
        app.get(&format!("/admin/bookings/{}", booking_id), Some(&admin))
            .await,
    )
    .await;
    assert_eq!(seen["_id"].as_str().unwrap(), booking_id);

    let cancelled = data(
        app.post(
            &format!("/admin/bookings/{}/cancel", booking_id),
            Some(&admin),
            json!({}),
        )
        .await,
    )
    .await;
    assert_eq!(cancelled["status"], json!("cancelled"));
    assert_eq!(cancelled["cancellation_reason"], json!("Cancelled by admin"));
}

#[tokio::test]
async fn available_agents_rank_best_first_and_filter_by_skill() {
    let app = TestApp::spawn().await;
    let admin = app.seed_admin().await;
    let service = app.seed_service("Deep cleaning", 200.0).await;

    for (name, skill, rating, completed) in [
        ("Rookie", "cleaning", 1.0, 0u32),
        ("Veteran", "cleaning", 5.0, 7),
        ("Peer", "cleaning", 5.0, 2),
        ("Tiler", "tiling", 4.0, 9),
    ] {
        let mut agent = Agent::new(
            name.to_string(),
            format!("{}@agents.servicehub.test", Uuid::new_v4()),
            "+917777666555".to_string(),
            vec![skill.to_string()],
        );
        agent.rating = rating;
        agent.completed_bookings = completed;
        app.stores.agents.insert(agent).await.unwrap();
    }

    let names = |body: &serde_json::Value| -> Vec<String> {
        body.as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap().to_string())
            .collect()
    };

    // Rating descending, completed bookings breaking the tie.
    let all = data(app.get("/admin/agents", Some(&admin)).await).await;
    assert_eq!(names(&all), vec!["Veteran", "Peer", "Tiler", "Rookie"]);

    // Narrowed to agents skilled in the service's category.
    let path = format!("/admin/agents?service_id={}", service.id);
    let qualified = data(app.get(&path, Some(&admin)).await).await;
    assert_eq!(names(&qualified), vec!["Veteran", "Peer", "Rookie"]);

    let missing = app
        .get(
            &format!("/admin/agents?service_id={}", Uuid::new_v4()),
            Some(&admin),
        )
        .await;
    assert_eq!(error_of(missing, 404).await, "Service not found");
}

#[tokio::test]
async fn admin_booking_listing_pages_and_filters_by_date() {
    let app = TestApp::spawn().await;
    let (token, _) = app.register_customer("planner@example.com").await;
    let service = app.seed_service("Gardening", 150.0).await;
    let admin = app.seed_admin().await;

    for days in [3, 10, 20] {
        let order_id = app.create_intent(&token, 150.0, "card").await;
        data(
            app.verify_payment(
                &token,
                &order_id,
                service.id,
                Some(Utc::now() + Duration::days(days)),
            )
            .await,
        )
        .await;
    }

    let window = format!(
        "/admin/bookings?start_date={}&end_date={}",
        (Utc::now() + Duration::days(5)).to_rfc3339_opts(SecondsFormat::Secs, true),
        (Utc::now() + Duration::days(15)).to_rfc3339_opts(SecondsFormat::Secs, true),
    );
    let in_window = data(app.get(&window, Some(&admin)).await).await;
    assert_eq!(in_window.as_array().unwrap().len(), 1);

    let first_page = data(app.get("/admin/bookings?limit=2&page=1", Some(&admin)).await).await;
    assert_eq!(first_page.as_array().unwrap().len(), 2);
    let second_page = data(app.get("/admin/bookings?limit=2&page=2", Some(&admin)).await).await;
    assert_eq!(second_page.as_array().unwrap().len(), 1);

    let bad = app.get("/admin/bookings?limit=0", Some(&admin)).await;
    error_of(bad, 400).await;
}
