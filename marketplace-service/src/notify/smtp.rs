use std::sync::atomic::{AtomicU64, Ordering};

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use service_core::async_trait::async_trait;

use crate::config::SmtpConfig;

use super::{EmailMessage, EmailSender, SendError};

pub struct SmtpSender {
    config: SmtpConfig,
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
}

impl SmtpSender {
    pub fn new(config: SmtpConfig) -> Result<Self, SendError> {
        if !config.enabled {
            return Ok(Self {
                config,
                transport: None,
            });
        }

        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| SendError::Configuration(format!("Failed to create SMTP relay: {}", e)))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            config,
            transport: Some(transport),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpSender {
    async fn send(&self, email: &EmailMessage) -> Result<(), SendError> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            SendError::NotEnabled("SMTP transport is not enabled".to_string())
        })?;

        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| SendError::Configuration(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email
            .to
            .parse()
            .map_err(|e| SendError::InvalidRecipient(format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email.subject)
            .header(ContentType::TEXT_PLAIN)
            .body(email.body.clone())
            .map_err(|e| SendError::SendFailed(format!("Failed to build message: {}", e)))?;

        transport
            .send(message)
            .await
            .map_err(|e| SendError::SendFailed(format!("Failed to send email: {}", e)))?;

        tracing::info!(to = %email.to, subject = %email.subject, "email sent");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

/// Counting sender for tests.
pub struct MockSender {
    enabled: bool,
    send_count: AtomicU64,
}

impl MockSender {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            send_count: AtomicU64::new(0),
        }
    }

    pub fn send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmailSender for MockSender {
    async fn send(&self, email: &EmailMessage) -> Result<(), SendError> {
        if !self.enabled {
            return Err(SendError::NotEnabled(
                "Mock sender is not enabled".to_string(),
            ));
        }
        self.send_count.fetch_add(1, Ordering::SeqCst);
        tracing::info!(to = %email.to, subject = %email.subject, "[MOCK] email would be sent");
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
