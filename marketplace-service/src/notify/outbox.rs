//! Persisted notification outbox. The record is written before any delivery
//! attempt and the attempt itself runs detached, so a slow or failing mail
//! relay can never roll back the state change that triggered it.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::Notification;
use crate::store::NotificationStore;

use super::{EmailMessage, EmailSender};

#[derive(Clone)]
pub struct Outbox {
    store: Arc<dyn NotificationStore>,
    sender: Arc<dyn EmailSender>,
    send_timeout: Duration,
}

impl Outbox {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        sender: Arc<dyn EmailSender>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            store,
            sender,
            send_timeout,
        }
    }

    /// Persists a queued record, then attempts delivery on a detached task.
    /// Only the persist step can fail; delivery outcomes land back on the
    /// record as sent or failed.
    pub async fn enqueue(
        &self,
        recipient: String,
        subject: String,
        body: String,
        booking_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let notification = Notification::queued(recipient, subject, body, booking_id);
        self.store.insert(notification.clone()).await?;

        let store = Arc::clone(&self.store);
        let sender = Arc::clone(&self.sender);
        let timeout = self.send_timeout;
        tokio::spawn(async move {
            deliver(store, sender, timeout, notification).await;
        });
        Ok(())
    }
}

async fn deliver(
    store: Arc<dyn NotificationStore>,
    sender: Arc<dyn EmailSender>,
    timeout: Duration,
    notification: Notification,
) {
    // Dry-run mode: no relay configured, the record is the delivery.
    if !sender.is_enabled() {
        tracing::debug!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "mail relay disabled, marking notification as sent"
        );
        mark_sent(&store, notification.id).await;
        return;
    }

    let message = EmailMessage {
        to: notification.recipient.clone(),
        subject: notification.subject.clone(),
        body: notification.body.clone(),
    };

    match tokio::time::timeout(timeout, sender.send(&message)).await {
        Ok(Ok(())) => mark_sent(&store, notification.id).await,
        Ok(Err(err)) => {
            tracing::warn!(
                recipient = %notification.recipient,
                error = %err,
                "notification delivery failed"
            );
            mark_failed(&store, notification.id, err.to_string()).await;
        }
        Err(_) => {
            tracing::warn!(
                recipient = %notification.recipient,
                "notification delivery timed out"
            );
            mark_failed(&store, notification.id, "delivery timed out".to_string()).await;
        }
    }
}

async fn mark_sent(store: &Arc<dyn NotificationStore>, id: Uuid) {
    if let Err(err) = store.mark_sent(id, Utc::now()).await {
        tracing::error!(notification_id = %id, error = %err, "failed to mark notification sent");
    }
}

async fn mark_failed(store: &Arc<dyn NotificationStore>, id: Uuid, reason: String) {
    if let Err(err) = store.mark_failed(id, reason).await {
        tracing::error!(notification_id = %id, error = %err, "failed to mark notification failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::models::NotificationStatus;
    use crate::notify::MockSender;
    use crate::store::memory::MemoryNotifications;

    async fn settled_record(store: &Arc<dyn NotificationStore>, recipient: &str) -> Notification {
        // Delivery runs on a detached task; poll until it lands.
        for _ in 0..50 {
            let records = store.list_for_recipient(recipient).await.unwrap();
            if let Some(record) = records
                .iter()
                .find(|n| n.status != NotificationStatus::Queued)
            {
                return record.clone();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("notification never left the queued state");
    }

    #[tokio::test]
    async fn enabled_sender_delivers_and_marks_sent() {
        let store: Arc<dyn NotificationStore> = Arc::new(MemoryNotifications::default());
        let sender = Arc::new(MockSender::new(true));
        let outbox = Outbox::new(
            Arc::clone(&store),
            sender.clone(),
            Duration::from_secs(1),
        );

        outbox
            .enqueue(
                "customer@example.com".into(),
                "Subject".into(),
                "Body".into(),
                None,
            )
            .await
            .unwrap();

        let record = settled_record(&store, "customer@example.com").await;
        assert_eq!(record.status, NotificationStatus::Sent);
        assert!(record.delivered_utc.is_some());
        assert_eq!(sender.send_count(), 1);
    }

    #[tokio::test]
    async fn disabled_sender_dry_runs_as_sent() {
        let store: Arc<dyn NotificationStore> = Arc::new(MemoryNotifications::default());
        let sender = Arc::new(MockSender::new(false));
        let outbox = Outbox::new(
            Arc::clone(&store),
            sender.clone(),
            Duration::from_secs(1),
        );

        outbox
            .enqueue(
                "customer@example.com".into(),
                "Subject".into(),
                "Body".into(),
                None,
            )
            .await
            .unwrap();

        let record = settled_record(&store, "customer@example.com").await;
        assert_eq!(record.status, NotificationStatus::Sent);
        assert_eq!(sender.send_count(), 0);
    }
}
