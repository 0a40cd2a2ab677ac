//! Booking lifecycle orchestration. Every transition is applied through a
//! guarded store update; a caller that loses the race gets a state conflict
//! instead of a double-applied side effect. Notification enqueueing happens
//! after the transition committed and its outcome never propagates back.

pub mod transitions;

use chrono::{DateTime, Duration, Utc};
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{Account, AgentSnapshot, Booking, LineItem, PaymentIntent, PaymentStatus};
use crate::notify::{templates, Outbox};
use crate::store::Stores;

/// One cart entry as submitted by the client. Pricing always comes from the
/// catalog, never from the request.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub service_id: Uuid,
    pub quantity: u32,
}

/// Outcome of a successful payment verification.
pub struct VerifiedBooking {
    pub booking: Booking,
    pub payment: PaymentIntent,
    pub points_awarded: i64,
}

#[derive(Clone)]
pub struct BookingWorkflow {
    stores: Stores,
    outbox: Outbox,
    company_email: String,
}

impl BookingWorkflow {
    pub fn new(stores: Stores, outbox: Outbox, company_email: String) -> Self {
        Self {
            stores,
            outbox,
            company_email,
        }
    }

    /// Settles a pending payment and creates the booking it paid for.
    /// The pending-to-completed flip is the linearization point: reward
    /// points and the booking are only produced by the call that wins it.
    pub async fn verify_and_book(
        &self,
        user: &Account,
        order_id: &str,
        cart: Vec<CartLine>,
        scheduled_utc: Option<DateTime<Utc>>,
        notes: String,
    ) -> Result<VerifiedBooking, AppError> {
        let now = Utc::now();
        let scheduled_utc = scheduled_utc.unwrap_or(now + Duration::days(7));

        let mut items = Vec::with_capacity(cart.len());
        for line in cart {
            let service = self
                .stores
                .catalog
                .find_by_id(line.service_id)
                .await?
                .ok_or_else(|| AppError::not_found("Service not found"))?;
            items.push(LineItem {
                service_id: service.id,
                name: service.title,
                price: service.price,
                quantity: line.quantity.max(1),
            });
        }
        let total = transitions::guard_create(&items, scheduled_utc, now)?;

        let intent = self
            .stores
            .payments
            .find_by_order(order_id, user.id)
            .await?
            .ok_or_else(|| AppError::not_found("Payment not found"))?;

        // A completed intent with no booking link is a verification that was
        // interrupted after settlement; the retry skips the settlement and
        // points (the settling call granted them) and resumes at booking
        // creation. The link CAS below keeps concurrent retries single-shot.
        let resuming = intent.status == PaymentStatus::Completed && intent.booking_id.is_none();

        let (mut payment, points_awarded) = if resuming {
            tracing::info!(order_id = %intent.order_id, "resuming interrupted verification");
            (intent, 0)
        } else {
            transitions::guard_verify(&intent)?;

            let payment = self
                .stores
                .payments
                .complete_if_pending(order_id, user.id)
                .await?
                .ok_or_else(|| {
                    AppError::StateConflict("Payment was already processed".to_string())
                })?;

            let points = payment.reward_points();
            if points > 0 {
                self.stores
                    .payments
                    .grant_points(
                        user.id,
                        points,
                        format!("Reward for order {}", payment.order_id),
                    )
                    .await?;
            }
            (payment, points)
        };

        let booking = Booking::new(user.id, items, total, payment.id, scheduled_utc, notes);
        self.stores.bookings.insert(booking.clone()).await?;

        if self
            .stores
            .payments
            .link_booking(payment.id, booking.id)
            .await?
        {
            payment.booking_id = Some(booking.id);
        } else {
            // A concurrent retry linked its own booking first; retract ours.
            self.stores.bookings.delete(booking.id).await?;
            return Err(AppError::StateConflict(
                "Payment was already processed".to_string(),
            ));
        }

        let (subject, body) = templates::payment_received(&user.name, &payment);
        self.notify(user.email.clone(), subject, body, Some(booking.id))
            .await;
        let (subject, body) = templates::booking_created(&user.name, &booking);
        self.notify(user.email.clone(), subject, body, Some(booking.id))
            .await;
        let (subject, body) = templates::booking_created_company(&booking);
        self.notify(self.company_email.clone(), subject, body, Some(booking.id))
            .await;

        tracing::info!(
            booking_id = %booking.id,
            order_id = %payment.order_id,
            total = total,
            "booking created from completed payment"
        );

        Ok(VerifiedBooking {
            booking,
            payment,
            points_awarded,
        })
    }

    /// Assigns an agent to a pending booking and confirms it.
    pub async fn confirm(&self, booking_id: Uuid, agent_id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .stores
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))?;
        transitions::guard_confirm(&booking)?;

        let agent = self
            .stores
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or_else(|| AppError::not_found("Agent not found"))?;
        if !agent.is_active {
            return Err(AppError::bad_request("Agent is not active"));
        }

        let snapshot = AgentSnapshot {
            id: agent.id,
            name: agent.name.clone(),
            phone: agent.phone.clone(),
            email: agent.email.clone(),
            assigned_utc: Utc::now(),
        };

        let booking = self
            .stores
            .bookings
            .confirm_pending(booking_id, snapshot)
            .await?
            .ok_or_else(|| {
                AppError::StateConflict("Booking is no longer pending".to_string())
            })?;

        if !self.stores.agents.record_assignment(agent.id).await? {
            tracing::warn!(agent_id = %agent.id, "agent deactivated while being assigned");
        }

        let agent_snapshot = booking
            .agent
            .clone()
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("confirmed booking lost agent")))?;

        if let Some(customer) = self.stores.accounts.find_by_id(booking.user_id).await? {
            let (subject, body) =
                templates::booking_confirmed(&customer.name, &booking, &agent_snapshot);
            self.notify(customer.email, subject, body, Some(booking.id))
                .await;
        }
        let (subject, body) = templates::booking_confirmed_company(&booking, &agent_snapshot);
        self.notify(self.company_email.clone(), subject, body, Some(booking.id))
            .await;
        let (subject, body) = templates::agent_assignment(&booking, &agent_snapshot);
        self.notify(agent_snapshot.email.clone(), subject, body, Some(booking.id))
            .await;

        tracing::info!(booking_id = %booking.id, agent_id = %agent.id, "booking confirmed");
        Ok(booking)
    }

    /// Cancels a pending or confirmed booking. `user_scope` restricts the
    /// cancellation to the booking owner; admins pass `None`.
    pub async fn cancel(
        &self,
        booking_id: Uuid,
        user_scope: Option<Uuid>,
        reason: String,
    ) -> Result<Booking, AppError> {
        let booking = match user_scope {
            Some(user_id) => self.stores.bookings.find_for_user(booking_id, user_id).await?,
            None => self.stores.bookings.find_by_id(booking_id).await?,
        }
        .ok_or_else(|| AppError::not_found("Booking not found"))?;
        transitions::guard_cancel(&booking)?;

        let booking = self
            .stores
            .bookings
            .cancel_active(booking_id, user_scope, reason, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::StateConflict("Booking was already finalized".to_string())
            })?;

        if let Some(agent) = &booking.agent {
            self.stores.agents.release_assignment(agent.id).await?;
        }

        if let Some(customer) = self.stores.accounts.find_by_id(booking.user_id).await? {
            let (subject, body) = templates::booking_cancelled(&customer.name, &booking);
            self.notify(customer.email, subject, body, Some(booking.id))
                .await;
        }
        let (subject, body) = templates::booking_cancelled_company(&booking);
        self.notify(self.company_email.clone(), subject, body, Some(booking.id))
            .await;

        tracing::info!(booking_id = %booking.id, "booking cancelled");
        Ok(booking)
    }

    /// Moves a booking to a new future date. Owner-scoped.
    pub async fn reschedule(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        scheduled_utc: DateTime<Utc>,
    ) -> Result<Booking, AppError> {
        let booking = self
            .stores
            .bookings
            .find_for_user(booking_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))?;
        transitions::guard_reschedule(&booking, scheduled_utc, Utc::now())?;

        let booking = self
            .stores
            .bookings
            .reschedule_active(booking_id, user_id, scheduled_utc)
            .await?
            .ok_or_else(|| {
                AppError::StateConflict("Booking was already finalized".to_string())
            })?;

        tracing::info!(
            booking_id = %booking.id,
            scheduled_utc = %booking.scheduled_utc,
            "booking rescheduled"
        );
        Ok(booking)
    }

    /// Marks a confirmed booking as done and credits the agent.
    pub async fn complete(&self, booking_id: Uuid) -> Result<Booking, AppError> {
        let booking = self
            .stores
            .bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::not_found("Booking not found"))?;
        transitions::guard_complete(&booking)?;

        let booking = self
            .stores
            .bookings
            .complete_confirmed(booking_id, Utc::now())
            .await?
            .ok_or_else(|| {
                AppError::StateConflict("Booking is no longer confirmed".to_string())
            })?;

        if let Some(agent) = &booking.agent {
            self.stores.agents.record_completion(agent.id).await?;
        }

        if let Some(customer) = self.stores.accounts.find_by_id(booking.user_id).await? {
            let (subject, body) = templates::booking_completed(&customer.name, &booking);
            self.notify(customer.email, subject, body, Some(booking.id))
                .await;
        }

        tracing::info!(booking_id = %booking.id, "booking completed");
        Ok(booking)
    }

    async fn notify(
        &self,
        recipient: String,
        subject: String,
        body: String,
        booking_id: Option<Uuid>,
    ) {
        if let Err(err) = self.outbox.enqueue(recipient, subject, body, booking_id).await {
            tracing::warn!(error = %err, "failed to enqueue notification");
        }
    }
}
