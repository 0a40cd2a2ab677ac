//! In-memory stores for tests and local development without a database.
//! Guard semantics mirror the MongoDB implementations exactly: each guarded
//! transition checks and mutates under one write lock.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use service_core::async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Account, Agent, AgentSnapshot, Booking, BookingStatus, Notification, NotificationStatus,
    PaymentIntent, PaymentStatus, PointsEntry, ProfileChanges, ResetCode, RewardPoints,
    SavedCard, Service, ServiceChanges, Wallet,
};

use super::{
    AccountStore, AgentStore, BookingFilter, BookingStore, CatalogQuery, CatalogStore,
    NotificationStore, PaymentStore,
};

fn lock_poisoned() -> AppError {
    AppError::Internal(anyhow::anyhow!("store lock poisoned"))
}

macro_rules! rlock {
    ($lock:expr) => {
        $lock.read().map_err(|_| lock_poisoned())?
    };
}

macro_rules! wlock {
    ($lock:expr) => {
        $lock.write().map_err(|_| lock_poisoned())?
    };
}

#[derive(Default)]
pub struct MemoryAccounts {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

#[async_trait]
impl AccountStore for MemoryAccounts {
    async fn insert(&self, account: Account) -> Result<(), AppError> {
        let mut accounts = wlock!(self.accounts);
        if accounts.values().any(|a| a.email == account.email) {
            return Err(AppError::bad_request("Email already registered"));
        }
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(rlock!(self.accounts).get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(rlock!(self.accounts)
            .values()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Account>, AppError> {
        let mut accounts = wlock!(self.accounts);
        Ok(accounts.get_mut(&id).map(|account| {
            if let Some(name) = changes.name {
                account.name = name;
            }
            if let Some(email) = changes.email {
                account.email = email;
            }
            if let Some(phone) = changes.phone {
                account.phone = phone;
            }
            account.clone()
        }))
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, AppError> {
        let mut accounts = wlock!(self.accounts);
        Ok(match accounts.get_mut(&id) {
            Some(account) => {
                account.password_hash = password_hash;
                account.reset_code = None;
                true
            }
            None => false,
        })
    }

    async fn set_reset_code(&self, email: &str, code: ResetCode) -> Result<bool, AppError> {
        let mut accounts = wlock!(self.accounts);
        Ok(match accounts.values_mut().find(|a| a.email == email) {
            Some(account) => {
                account.reset_code = Some(code);
                true
            }
            None => false,
        })
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, AppError> {
        let mut accounts = wlock!(self.accounts);
        Ok(match accounts.get_mut(&id) {
            Some(account) => {
                account.is_verified = true;
                true
            }
            None => false,
        })
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    services: RwLock<HashMap<Uuid, Service>>,
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn insert(&self, service: Service) -> Result<(), AppError> {
        wlock!(self.services).insert(service.id, service);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(rlock!(self.services).get(&id).cloned())
    }

    async fn list(&self, query: CatalogQuery) -> Result<Vec<Service>, AppError> {
        let services = rlock!(self.services);
        let mut matched: Vec<Service> = services
            .values()
            .filter(|s| {
                query
                    .category
                    .as_deref()
                    .map_or(true, |c| s.category == c)
            })
            .filter(|s| {
                query
                    .provider_id
                    .map_or(true, |p| s.provider_id == p)
            })
            .filter(|s| {
                query.search.as_deref().map_or(true, |q| {
                    let q = q.to_lowercase();
                    s.title.to_lowercase().contains(&q)
                        || s.description.to_lowercase().contains(&q)
                })
            })
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(matched)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError> {
        let mut services = wlock!(self.services);
        Ok(services.get_mut(&id).map(|service| {
            if let Some(title) = changes.title {
                service.title = title;
            }
            if let Some(description) = changes.description {
                service.description = description;
            }
            if let Some(category) = changes.category {
                service.category = category;
            }
            if let Some(price) = changes.price {
                service.price = price;
            }
            if let Some(image) = changes.image {
                service.image = Some(image);
            }
            if let Some(location) = changes.location {
                service.location = location;
            }
            if let Some(availability) = changes.availability {
                service.availability = availability;
            }
            service.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(wlock!(self.services).remove(&id).is_some())
    }
}

#[derive(Default)]
pub struct MemoryPayments {
    intents: RwLock<HashMap<Uuid, PaymentIntent>>,
    cards: RwLock<HashMap<Uuid, SavedCard>>,
    wallets: RwLock<HashMap<Uuid, Wallet>>,
    points: RwLock<HashMap<Uuid, RewardPoints>>,
}

#[async_trait]
impl PaymentStore for MemoryPayments {
    async fn insert_intent(&self, intent: PaymentIntent) -> Result<(), AppError> {
        let mut intents = wlock!(self.intents);
        if intents.values().any(|i| i.order_id == intent.order_id) {
            return Err(AppError::bad_request("Duplicate order ID"));
        }
        intents.insert(intent.id, intent);
        Ok(())
    }

    async fn find_by_order(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        Ok(rlock!(self.intents)
            .values()
            .find(|i| i.order_id == order_id && i.user_id == user_id)
            .cloned())
    }

    async fn complete_if_pending(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        let mut intents = wlock!(self.intents);
        Ok(intents
            .values_mut()
            .find(|i| {
                i.order_id == order_id
                    && i.user_id == user_id
                    && i.status == PaymentStatus::Pending
            })
            .map(|intent| {
                intent.status = PaymentStatus::Completed;
                intent.updated_utc = Utc::now();
                intent.clone()
            }))
    }

    async fn link_booking(&self, intent_id: Uuid, booking_id: Uuid) -> Result<bool, AppError> {
        let mut intents = wlock!(self.intents);
        Ok(match intents.get_mut(&intent_id) {
            Some(intent)
                if intent.status == PaymentStatus::Completed && intent.booking_id.is_none() =>
            {
                intent.booking_id = Some(booking_id);
                intent.updated_utc = Utc::now();
                true
            }
            _ => false,
        })
    }

    async fn mark_failed(&self, order_id: &str, user_id: Uuid) -> Result<bool, AppError> {
        let mut intents = wlock!(self.intents);
        Ok(match intents.values_mut().find(|i| {
            i.order_id == order_id && i.user_id == user_id && i.status == PaymentStatus::Pending
        }) {
            Some(intent) => {
                intent.status = PaymentStatus::Failed;
                intent.updated_utc = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentIntent>, AppError> {
        let mut intents: Vec<PaymentIntent> = rlock!(self.intents)
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        intents.sort_by(|a, b| b.created_utc.cmp(&a.created_utc));
        Ok(intents)
    }

    async fn save_card(&self, card: SavedCard) -> Result<(), AppError> {
        wlock!(self.cards).insert(card.id, card);
        Ok(())
    }

    async fn list_cards(&self, user_id: Uuid) -> Result<Vec<SavedCard>, AppError> {
        Ok(rlock!(self.cards)
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_wallet(&self, user_id: Uuid) -> Result<Option<Wallet>, AppError> {
        Ok(rlock!(self.wallets)
            .values()
            .find(|w| w.user_id == user_id)
            .cloned())
    }

    async fn get_points(&self, user_id: Uuid) -> Result<Option<RewardPoints>, AppError> {
        Ok(rlock!(self.points)
            .values()
            .find(|p| p.user_id == user_id)
            .cloned())
    }

    async fn grant_points(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<(), AppError> {
        let entry = PointsEntry {
            kind: "earn".to_string(),
            points,
            description,
            created_utc: Utc::now(),
        };
        let mut ledger = wlock!(self.points);
        match ledger.values_mut().find(|p| p.user_id == user_id) {
            Some(record) => {
                record.points += points;
                record.transactions.push(entry);
            }
            None => {
                let id = Uuid::new_v4();
                ledger.insert(
                    id,
                    RewardPoints {
                        id,
                        user_id,
                        points,
                        transactions: vec![entry],
                    },
                );
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBookings {
    bookings: RwLock<HashMap<Uuid, Booking>>,
}

#[async_trait]
impl BookingStore for MemoryBookings {
    async fn insert(&self, booking: Booking) -> Result<(), AppError> {
        wlock!(self.bookings).insert(booking.id, booking);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(rlock!(self.bookings).get(&id).cloned())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Booking>, AppError> {
        Ok(rlock!(self.bookings)
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = rlock!(self.bookings)
            .values()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_utc.cmp(&a.booked_utc));
        Ok(bookings)
    }

    async fn list_all(&self, filter: BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = rlock!(self.bookings)
            .values()
            .filter(|b| filter.status.as_deref().map_or(true, |s| b.status.as_str() == s))
            .filter(|b| filter.from_utc.map_or(true, |from| b.scheduled_utc >= from))
            .filter(|b| filter.to_utc.map_or(true, |to| b.scheduled_utc <= to))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.booked_utc.cmp(&a.booked_utc));
        Ok(bookings
            .into_iter()
            .skip(filter.skip as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        Ok(wlock!(self.bookings).remove(&id).is_some())
    }

    async fn confirm_pending(
        &self,
        id: Uuid,
        agent: AgentSnapshot,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = wlock!(self.bookings);
        Ok(bookings
            .get_mut(&id)
            .filter(|b| b.status == BookingStatus::Pending)
            .map(|booking| {
                booking.status = BookingStatus::Confirmed;
                booking.agent = Some(agent);
                booking.clone()
            }))
    }

    async fn cancel_active(
        &self,
        id: Uuid,
        user_scope: Option<Uuid>,
        reason: String,
        cancelled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = wlock!(self.bookings);
        Ok(bookings
            .get_mut(&id)
            .filter(|b| !b.status.is_terminal())
            .filter(|b| user_scope.map_or(true, |u| b.user_id == u))
            .map(|booking| {
                booking.status = BookingStatus::Cancelled;
                booking.cancellation_reason = Some(reason);
                booking.cancelled_utc = Some(cancelled_utc);
                booking.clone()
            }))
    }

    async fn reschedule_active(
        &self,
        id: Uuid,
        user_id: Uuid,
        scheduled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = wlock!(self.bookings);
        Ok(bookings
            .get_mut(&id)
            .filter(|b| b.user_id == user_id && !b.status.is_terminal())
            .map(|booking| {
                booking.scheduled_utc = scheduled_utc;
                booking.clone()
            }))
    }

    async fn complete_confirmed(
        &self,
        id: Uuid,
        completed_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut bookings = wlock!(self.bookings);
        Ok(bookings
            .get_mut(&id)
            .filter(|b| b.status == BookingStatus::Confirmed)
            .map(|booking| {
                booking.status = BookingStatus::Completed;
                booking.completed_utc = Some(completed_utc);
                booking.clone()
            }))
    }
}

#[derive(Default)]
pub struct MemoryAgents {
    agents: RwLock<HashMap<Uuid, Agent>>,
}

#[async_trait]
impl AgentStore for MemoryAgents {
    async fn insert(&self, agent: Agent) -> Result<(), AppError> {
        wlock!(self.agents).insert(agent.id, agent);
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        Ok(rlock!(self.agents).get(&id).cloned())
    }

    async fn list(&self, active_only: bool, skill: Option<&str>) -> Result<Vec<Agent>, AppError> {
        let mut agents: Vec<Agent> = rlock!(self.agents)
            .values()
            .filter(|a| !active_only || a.is_active)
            .filter(|a| skill.map_or(true, |s| a.skills.iter().any(|k| k == s)))
            .cloned()
            .collect();
        agents.sort_by(|a, b| {
            b.rating
                .total_cmp(&a.rating)
                .then(b.completed_bookings.cmp(&a.completed_bookings))
        });
        Ok(agents)
    }

    async fn record_assignment(&self, id: Uuid) -> Result<bool, AppError> {
        let mut agents = wlock!(self.agents);
        Ok(match agents.get_mut(&id).filter(|a| a.is_active) {
            Some(agent) => {
                agent.total_bookings += 1;
                true
            }
            None => false,
        })
    }

    async fn release_assignment(&self, id: Uuid) -> Result<bool, AppError> {
        let mut agents = wlock!(self.agents);
        Ok(match agents.get_mut(&id).filter(|a| a.total_bookings > 0) {
            Some(agent) => {
                agent.total_bookings -= 1;
                true
            }
            None => false,
        })
    }

    async fn record_completion(&self, id: Uuid) -> Result<bool, AppError> {
        let mut agents = wlock!(self.agents);
        Ok(match agents.get_mut(&id) {
            Some(agent) => {
                agent.completed_bookings += 1;
                true
            }
            None => false,
        })
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, AppError> {
        let mut agents = wlock!(self.agents);
        Ok(match agents.get_mut(&id) {
            Some(agent) => {
                agent.is_active = active;
                true
            }
            None => false,
        })
    }
}

#[derive(Default)]
pub struct MemoryNotifications {
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

#[async_trait]
impl NotificationStore for MemoryNotifications {
    async fn insert(&self, notification: Notification) -> Result<(), AppError> {
        wlock!(self.notifications).insert(notification.id, notification);
        Ok(())
    }

    async fn mark_sent(&self, id: Uuid, delivered_utc: DateTime<Utc>) -> Result<bool, AppError> {
        let mut notifications = wlock!(self.notifications);
        Ok(match notifications
            .get_mut(&id)
            .filter(|n| n.status == NotificationStatus::Queued)
        {
            Some(notification) => {
                notification.status = NotificationStatus::Sent;
                notification.delivered_utc = Some(delivered_utc);
                true
            }
            None => false,
        })
    }

    async fn mark_failed(&self, id: Uuid, reason: String) -> Result<bool, AppError> {
        let mut notifications = wlock!(self.notifications);
        Ok(match notifications
            .get_mut(&id)
            .filter(|n| n.status == NotificationStatus::Queued)
        {
            Some(notification) => {
                notification.status = NotificationStatus::Failed;
                notification.failure_reason = Some(reason);
                true
            }
            None => false,
        })
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Notification>, AppError> {
        Ok(rlock!(self.notifications)
            .values()
            .filter(|n| n.booking_id == Some(booking_id))
            .cloned()
            .collect())
    }

    async fn list_for_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError> {
        Ok(rlock!(self.notifications)
            .values()
            .filter(|n| n.recipient == recipient)
            .cloned()
            .collect())
    }
}
