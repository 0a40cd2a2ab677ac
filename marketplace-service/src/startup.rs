//! Application startup and lifecycle management.

use std::sync::Arc;
use std::time::Duration;

use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;

use crate::config::Config;
use crate::notify::{Outbox, SmtpSender};
use crate::services::{GoogleVerifier, TokenService};
use crate::store::{mongo, Stores};
use crate::workflow::BookingWorkflow;
use crate::{build_router, AppState};

pub struct Application {
    port: u16,
    listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build against MongoDB as configured.
    pub async fn build(config: Config) -> anyhow::Result<Self> {
        let mut client_options = ClientOptions::parse(config.database.url.expose_secret()).await?;
        client_options.app_name = Some(config.service_name.clone());

        let client = Client::with_options(client_options)?;
        let db = client.database(&config.database.db_name);
        mongo::init_indexes(&db).await?;

        let stores = Stores::mongo(&db);
        Self::assemble(config, stores).await
    }

    /// Build against the given store handles. Used by tests to run the full
    /// HTTP stack over in-memory state.
    pub async fn with_stores(config: Config, stores: Stores) -> anyhow::Result<Self> {
        Self::assemble(config, stores).await
    }

    async fn assemble(config: Config, stores: Stores) -> anyhow::Result<Self> {
        let sender = SmtpSender::new(config.smtp.clone())
            .map_err(|e| anyhow::anyhow!("SMTP setup failed: {}", e))?;
        if !config.smtp.enabled {
            tracing::warn!("SMTP disabled, notifications will be recorded but not delivered");
        }

        let outbox = Outbox::new(
            Arc::clone(&stores.notifications),
            Arc::new(sender),
            Duration::from_secs(config.smtp.send_timeout_seconds),
        );

        let tokens = TokenService::new(&config.jwt);
        let google = GoogleVerifier::new(config.google.client_id.clone());
        let workflow = BookingWorkflow::new(
            stores.clone(),
            outbox.clone(),
            config.smtp.company_email.clone(),
        );

        let state = AppState {
            config: Arc::new(config.clone()),
            stores,
            tokens,
            google,
            workflow,
            outbox,
        };

        // Port 0 binds an ephemeral port for tests.
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        let port = listener.local_addr()?.port();

        Ok(Self {
            port,
            listener,
            state,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    pub async fn run_until_stopped(self) -> anyhow::Result<()> {
        let router = build_router(self.state);
        tracing::info!("Listening on port {}", self.port);
        axum::serve(self.listener, router).await?;
        Ok(())
    }
}
