//! Test harness for end-to-end workflow tests.
//!
//! Spawns the full HTTP application on an ephemeral port over in-memory
//! stores, so tests exercise routing, auth, validation and the booking
//! workflow without external infrastructure.

use std::sync::Once;

use chrono::{DateTime, Utc};
use secrecy::Secret;
use serde_json::{json, Value};
use uuid::Uuid;

use marketplace_service::config::{
    Config, DatabaseConfig, GoogleConfig, JwtConfig, ServerConfig, SmtpConfig, UpiConfig,
};
use marketplace_service::models::{Account, Agent, Role, Service};
use marketplace_service::store::Stores;
use marketplace_service::utils::hash_password;
use marketplace_service::workflow::BookingWorkflow;
use marketplace_service::Application;

static TRACING: Once = Once::new();

pub const COMPANY_EMAIL: &str = "bookings@servicehub.test";

fn init_tracing() {
    TRACING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
            tracing_subscriber::registry()
                .with(tracing_subscriber::EnvFilter::new("debug"))
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    });
}

fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: DatabaseConfig {
            url: Secret::new("mongodb://unused".to_string()),
            db_name: "unused".to_string(),
        },
        jwt: JwtConfig {
            secret: Secret::new("workflow-test-secret-0123456789abcdef".to_string()),
            register_expiry_hours: 24,
            login_expiry_days: 7,
        },
        smtp: SmtpConfig {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: String::new(),
            from_email: "no-reply@servicehub.test".to_string(),
            from_name: "ServiceHub".to_string(),
            company_email: COMPANY_EMAIL.to_string(),
            enabled: false,
            send_timeout_seconds: 1,
        },
        upi: UpiConfig {
            upi_id: Some("merchant@upi".to_string()),
            business_name: "ServiceHub".to_string(),
        },
        google: GoogleConfig { client_id: None },
        service_name: "marketplace-service".to_string(),
    }
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub stores: Stores,
    pub workflow: BookingWorkflow,
}

impl TestApp {
    pub async fn spawn() -> Self {
        init_tracing();
        let stores = Stores::in_memory();
        let app = Application::with_stores(test_config(), stores.clone())
            .await
            .expect("failed to build application");
        let port = app.port();
        let workflow = app.state().workflow;
        tokio::spawn(async move {
            app.run_until_stopped().await.expect("server crashed");
        });

        Self {
            address: format!("http://127.0.0.1:{}", port),
            client: reqwest::Client::new(),
            stores,
            workflow,
        }
    }

    pub async fn post(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut req = self
            .client
            .post(format!("{}{}", self.address, path))
            .json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("request failed")
    }

    pub async fn put(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut req = self
            .client
            .put(format!("{}{}", self.address, path))
            .json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("request failed")
    }

    pub async fn patch(&self, path: &str, token: Option<&str>, body: Value) -> reqwest::Response {
        let mut req = self
            .client
            .patch(format!("{}{}", self.address, path))
            .json(&body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("request failed")
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> reqwest::Response {
        let mut req = self.client.get(format!("{}{}", self.address, path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        req.send().await.expect("request failed")
    }

    /// Registers a customer through the API; returns (token, account id).
    pub async fn register_customer(&self, email: &str) -> (String, Uuid) {
        let response = self
            .post(
                "/auth/register",
                None,
                json!({
                    "name": "Test Customer",
                    "email": email,
                    "password": "customer-pass-1",
                    "phone": "+911112223334",
                }),
            )
            .await;
        assert_eq!(response.status(), 200, "registration failed");
        let body: Value = response.json().await.expect("invalid json");
        let token = body["data"]["token"].as_str().expect("no token").to_string();
        let id = body["data"]["user"]["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .expect("no user id");
        (token, id)
    }

    /// Admins cannot self-register; seed one directly and log in.
    pub async fn seed_admin(&self) -> String {
        let email = format!("admin-{}@servicehub.test", Uuid::new_v4());
        let account = Account::new(
            "Ops Admin".to_string(),
            email.clone(),
            hash_password("admin-pass-12").expect("hash failed"),
            "+919999999999".to_string(),
            Role::Admin,
            String::new(),
        );
        self.stores
            .accounts
            .insert(account)
            .await
            .expect("admin seed failed");

        let response = self
            .post(
                "/auth/login",
                None,
                json!({ "email": email, "password": "admin-pass-12" }),
            )
            .await;
        assert_eq!(response.status(), 200, "admin login failed");
        let body: Value = response.json().await.expect("invalid json");
        body["data"]["token"].as_str().expect("no token").to_string()
    }

    pub async fn seed_agent(&self, name: &str) -> Agent {
        let agent = Agent::new(
            name.to_string(),
            format!("{}@agents.servicehub.test", Uuid::new_v4()),
            "+918888777666".to_string(),
            vec!["cleaning".to_string()],
        );
        self.stores
            .agents
            .insert(agent.clone())
            .await
            .expect("agent seed failed");
        agent
    }

    pub async fn seed_service(&self, title: &str, price: f64) -> Service {
        let service = Service::new(
            title.to_string(),
            "Professional home service".to_string(),
            "cleaning".to_string(),
            price,
            None,
            Uuid::new_v4(),
            "Bengaluru".to_string(),
        );
        self.stores
            .catalog
            .insert(service.clone())
            .await
            .expect("service seed failed");
        service
    }

    /// Creates a pending intent through the API; returns the order ID.
    pub async fn create_intent(&self, token: &str, amount: f64, method: &str) -> String {
        let response = self
            .post(
                "/payments/intent",
                Some(token),
                json!({ "amount": amount, "method": method }),
            )
            .await;
        assert_eq!(response.status(), 200, "intent creation failed");
        let body: Value = response.json().await.expect("invalid json");
        body["data"]["payment"]["order_id"]
            .as_str()
            .expect("no order id")
            .to_string()
    }

    /// Verifies a payment against a single-service cart.
    pub async fn verify_payment(
        &self,
        token: &str,
        order_id: &str,
        service_id: Uuid,
        scheduled: Option<DateTime<Utc>>,
    ) -> reqwest::Response {
        let mut body = json!({
            "order_id": order_id,
            "services": [{ "service_id": service_id }],
        });
        if let Some(scheduled) = scheduled {
            body["scheduled_date"] = json!(scheduled.to_rfc3339());
        }
        self.post("/payments/verify", Some(token), body).await
    }
}

/// Unwraps the `{ success, data }` envelope and asserts success.
pub async fn data(response: reqwest::Response) -> Value {
    let status = response.status();
    let body: Value = response.json().await.expect("invalid json");
    assert_eq!(status, 200, "unexpected status: {}", body);
    assert_eq!(body["success"], json!(true), "unexpected envelope: {}", body);
    body["data"].clone()
}

/// Unwraps the error envelope and asserts the expected status.
pub async fn error_of(response: reqwest::Response, expected_status: u16) -> String {
    let status = response.status();
    let body: Value = response.json().await.expect("invalid json");
    assert_eq!(status, expected_status, "unexpected status: {}", body);
    assert_eq!(body["success"], json!(false), "unexpected envelope: {}", body);
    body["error"].as_str().expect("no error message").to_string()
}
