//! Persistence seams. Every state transition that must happen at most once is
//! expressed as a guarded update keyed on the expected pre-state; the store
//! returns the updated document on success and `None` when the guard failed,
//! so concurrent callers race safely and exactly one wins.

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use service_core::async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Account, Agent, AgentSnapshot, Booking, Notification, PaymentIntent, ProfileChanges,
    ResetCode, RewardPoints, SavedCard, Service, ServiceChanges, Wallet,
};

#[derive(Debug, Default, Clone)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub provider_id: Option<Uuid>,
}

/// Admin booking listing filter. The date bounds apply to `scheduled_utc`;
/// `skip`/`limit` page the newest-first result.
#[derive(Debug, Default, Clone)]
pub struct BookingFilter {
    pub status: Option<String>,
    pub from_utc: Option<DateTime<Utc>>,
    pub to_utc: Option<DateTime<Utc>>,
    pub skip: u64,
    pub limit: i64,
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn insert(&self, account: Account) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;
    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Account>, AppError>;
    /// Stores a fresh hash and clears any outstanding reset code.
    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, AppError>;
    async fn set_reset_code(&self, email: &str, code: ResetCode) -> Result<bool, AppError>;
    async fn mark_verified(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn insert(&self, service: Service) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError>;
    async fn list(&self, query: CatalogQuery) -> Result<Vec<Service>, AppError>;
    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert_intent(&self, intent: PaymentIntent) -> Result<(), AppError>;
    async fn find_by_order(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError>;
    /// Flips a pending intent to completed. Returns the completed intent on
    /// the winning call and `None` for every other caller.
    async fn complete_if_pending(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError>;
    /// Attaches a booking to a completed intent that has none yet.
    async fn link_booking(&self, intent_id: Uuid, booking_id: Uuid) -> Result<bool, AppError>;
    async fn mark_failed(&self, order_id: &str, user_id: Uuid) -> Result<bool, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentIntent>, AppError>;
    async fn save_card(&self, card: SavedCard) -> Result<(), AppError>;
    async fn list_cards(&self, user_id: Uuid) -> Result<Vec<SavedCard>, AppError>;
    async fn get_wallet(&self, user_id: Uuid) -> Result<Option<Wallet>, AppError>;
    async fn get_points(&self, user_id: Uuid) -> Result<Option<RewardPoints>, AppError>;
    async fn grant_points(
        &self,
        user_id: Uuid,
        points: i64,
        description: String,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: Booking) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError>;
    async fn find_for_user(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Booking>, AppError>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError>;
    async fn list_all(&self, filter: BookingFilter) -> Result<Vec<Booking>, AppError>;
    /// Removes a booking row outright. Only used to retract a booking whose
    /// payment link lost a race; settled bookings are cancelled, not deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
    async fn confirm_pending(
        &self,
        id: Uuid,
        agent: AgentSnapshot,
    ) -> Result<Option<Booking>, AppError>;
    /// Cancels while still pending or confirmed. `user_scope` additionally
    /// restricts the match to the owner when the caller is not an admin.
    async fn cancel_active(
        &self,
        id: Uuid,
        user_scope: Option<Uuid>,
        reason: String,
        cancelled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
    async fn reschedule_active(
        &self,
        id: Uuid,
        user_id: Uuid,
        scheduled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
    async fn complete_confirmed(
        &self,
        id: Uuid,
        completed_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError>;
}

#[async_trait]
pub trait AgentStore: Send + Sync {
    async fn insert(&self, agent: Agent) -> Result<(), AppError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, AppError>;
    /// Candidates come back best-first: rating descending, then completed
    /// bookings descending. `skill` narrows to agents qualified for it.
    async fn list(&self, active_only: bool, skill: Option<&str>) -> Result<Vec<Agent>, AppError>;
    /// Bumps the assignment counter; fails when the agent is inactive.
    async fn record_assignment(&self, id: Uuid) -> Result<bool, AppError>;
    /// Undoes one assignment. A counter already at zero stays at zero.
    async fn release_assignment(&self, id: Uuid) -> Result<bool, AppError>;
    async fn record_completion(&self, id: Uuid) -> Result<bool, AppError>;
    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, AppError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert(&self, notification: Notification) -> Result<(), AppError>;
    async fn mark_sent(&self, id: Uuid, delivered_utc: DateTime<Utc>) -> Result<bool, AppError>;
    async fn mark_failed(&self, id: Uuid, reason: String) -> Result<bool, AppError>;
    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Notification>, AppError>;
    async fn list_for_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError>;
}

/// Handle bundle passed through application state.
#[derive(Clone)]
pub struct Stores {
    pub accounts: Arc<dyn AccountStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub agents: Arc<dyn AgentStore>,
    pub notifications: Arc<dyn NotificationStore>,
}

impl Stores {
    pub fn mongo(db: &mongodb::Database) -> Self {
        Self {
            accounts: Arc::new(mongo::MongoAccounts::new(db)),
            catalog: Arc::new(mongo::MongoCatalog::new(db)),
            payments: Arc::new(mongo::MongoPayments::new(db)),
            bookings: Arc::new(mongo::MongoBookings::new(db)),
            agents: Arc::new(mongo::MongoAgents::new(db)),
            notifications: Arc::new(mongo::MongoNotifications::new(db)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            accounts: Arc::new(memory::MemoryAccounts::default()),
            catalog: Arc::new(memory::MemoryCatalog::default()),
            payments: Arc::new(memory::MemoryPayments::default()),
            bookings: Arc::new(memory::MemoryBookings::default()),
            agents: Arc::new(memory::MemoryAgents::default()),
            notifications: Arc::new(memory::MemoryNotifications::default()),
        }
    }
}
