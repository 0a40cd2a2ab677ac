use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub smtp: SmtpConfig,
    pub upi: UpiConfig,
    pub google: GoogleConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    /// Token lifetime issued at registration.
    pub register_expiry_hours: i64,
    /// Token lifetime issued at login and password reset.
    pub login_expiry_days: i64,
}

#[derive(Clone, Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
    pub from_name: String,
    /// Operations inbox copied on booking lifecycle mail.
    pub company_email: String,
    pub enabled: bool,
    /// Upper bound on a single delivery attempt, seconds.
    pub send_timeout_seconds: u64,
}

#[derive(Clone, Debug)]
pub struct UpiConfig {
    pub upi_id: Option<String>,
    pub business_name: String,
}

#[derive(Clone, Debug)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("MARKETPLACE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("MARKETPLACE_PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()?;

        let db_url = env::var("MARKETPLACE_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name =
            env::var("MARKETPLACE_DATABASE_NAME").unwrap_or_else(|_| "marketplace".to_string());

        let jwt_secret = env::var("MARKETPLACE_JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("MARKETPLACE_JWT_SECRET must be set"))?;

        let smtp = SmtpConfig {
            host: env::var("MARKETPLACE_SMTP_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("MARKETPLACE_SMTP_PORT")
                .unwrap_or_else(|_| "587".to_string())
                .parse()?,
            user: env::var("MARKETPLACE_SMTP_USER").unwrap_or_default(),
            password: env::var("MARKETPLACE_SMTP_PASSWORD").unwrap_or_default(),
            from_email: env::var("MARKETPLACE_FROM_EMAIL")
                .unwrap_or_else(|_| "no-reply@servicehub.local".to_string()),
            from_name: env::var("MARKETPLACE_FROM_NAME")
                .unwrap_or_else(|_| "ServiceHub".to_string()),
            company_email: env::var("MARKETPLACE_COMPANY_EMAIL")
                .unwrap_or_else(|_| "bookings@servicehub.local".to_string()),
            enabled: env::var("MARKETPLACE_SMTP_ENABLED")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            send_timeout_seconds: env::var("MARKETPLACE_SMTP_SEND_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .unwrap_or(10),
        };

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            jwt: JwtConfig {
                secret: Secret::new(jwt_secret),
                register_expiry_hours: 24,
                login_expiry_days: 7,
            },
            smtp,
            upi: UpiConfig {
                upi_id: env::var("MARKETPLACE_UPI_ID").ok(),
                business_name: env::var("MARKETPLACE_BUSINESS_NAME")
                    .unwrap_or_else(|_| "ServiceHub".to_string()),
            },
            google: GoogleConfig {
                client_id: env::var("MARKETPLACE_GOOGLE_CLIENT_ID").ok(),
            },
            service_name: "marketplace-service".to_string(),
        })
    }
}
