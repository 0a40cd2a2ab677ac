//! Email delivery behind a provider seam, plus the persisted outbox.

pub mod outbox;
pub mod smtp;
pub mod templates;

pub use outbox::Outbox;
pub use smtp::{MockSender, SmtpSender};

use service_core::async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SendError {
    #[error("Provider not enabled: {0}")]
    NotEnabled(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),
    #[error("Send error: {0}")]
    SendFailed(String),
}

#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &EmailMessage) -> Result<(), SendError>;
    fn is_enabled(&self) -> bool;
}
