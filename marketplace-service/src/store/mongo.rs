//! MongoDB-backed stores. Guarded transitions use `find_one_and_update`
//! so the status check and the write are a single atomic operation.

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{self, doc, Document};
use mongodb::options::{
    FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument, UpdateOptions,
};
use mongodb::{Collection, Database, IndexModel};
use service_core::async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

use crate::models::{
    Account, Agent, AgentSnapshot, Booking, Notification, PaymentIntent, PointsEntry,
    ProfileChanges, ResetCode, RewardPoints, SavedCard, Service, ServiceChanges, Wallet,
};

use super::{
    AccountStore, AgentStore, BookingFilter, BookingStore, CatalogQuery, CatalogStore,
    NotificationStore, PaymentStore,
};

/// Create the indexes every query path below relies on.
pub async fn init_indexes(db: &Database) -> Result<()> {
    let accounts: Collection<Account> = db.collection("accounts");
    let unique_email = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(
            IndexOptions::builder()
                .name("unique_email_idx".to_string())
                .unique(true)
                .build(),
        )
        .build();
    accounts.create_index(unique_email, None).await?;

    let payments: Collection<PaymentIntent> = db.collection("payments");
    let unique_order = IndexModel::builder()
        .keys(doc! { "order_id": 1 })
        .options(
            IndexOptions::builder()
                .name("unique_order_idx".to_string())
                .unique(true)
                .build(),
        )
        .build();
    let user_payments = IndexModel::builder()
        .keys(doc! { "user_id": 1, "status": 1 })
        .options(
            IndexOptions::builder()
                .name("user_payment_idx".to_string())
                .build(),
        )
        .build();
    payments
        .create_indexes([unique_order, user_payments], None)
        .await?;

    let bookings: Collection<Booking> = db.collection("bookings");
    let user_bookings = IndexModel::builder()
        .keys(doc! { "user_id": 1, "status": 1 })
        .options(
            IndexOptions::builder()
                .name("user_booking_idx".to_string())
                .build(),
        )
        .build();
    bookings.create_index(user_bookings, None).await?;

    let catalog: Collection<Service> = db.collection("services");
    let category_idx = IndexModel::builder()
        .keys(doc! { "category": 1, "availability": 1 })
        .options(
            IndexOptions::builder()
                .name("category_idx".to_string())
                .build(),
        )
        .build();
    catalog.create_index(category_idx, None).await?;

    tracing::info!("database indexes initialized");
    Ok(())
}

fn active_status_filter() -> Document {
    doc! { "$in": ["pending", "confirmed"] }
}

#[derive(Clone)]
pub struct MongoAccounts {
    collection: Collection<Account>,
}

impl MongoAccounts {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("accounts"),
        }
    }
}

#[async_trait]
impl AccountStore for MongoAccounts {
    async fn insert(&self, account: Account) -> Result<(), AppError> {
        self.collection.insert_one(account, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let account = self
            .collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        let account = self.collection.find_one(doc! { "email": email }, None).await?;
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> Result<Option<Account>, AppError> {
        let mut set = Document::new();
        if let Some(name) = changes.name {
            set.insert("name", name);
        }
        if let Some(email) = changes.email {
            set.insert("email", email);
        }
        if let Some(phone) = changes.phone {
            set.insert("phone", phone);
        }
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let account = self
            .collection
            .find_one_and_update(doc! { "_id": id.to_string() }, doc! { "$set": set }, options)
            .await?;
        Ok(account)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: String) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! {
                    "$set": { "password_hash": password_hash },
                    "$unset": { "reset_code": "" }
                },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn set_reset_code(&self, email: &str, code: ResetCode) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "email": email },
                doc! { "$set": { "reset_code": bson::to_bson(&code)? } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn mark_verified(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "is_verified": true } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}

#[derive(Clone)]
pub struct MongoCatalog {
    collection: Collection<Service>,
}

impl MongoCatalog {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("services"),
        }
    }
}

#[async_trait]
impl CatalogStore for MongoCatalog {
    async fn insert(&self, service: Service) -> Result<(), AppError> {
        self.collection.insert_one(service, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let service = self
            .collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(service)
    }

    async fn list(&self, query: CatalogQuery) -> Result<Vec<Service>, AppError> {
        let mut filter = Document::new();
        if let Some(category) = query.category {
            filter.insert("category", category);
        }
        if let Some(provider_id) = query.provider_id {
            filter.insert("provider_id", provider_id.to_string());
        }
        if let Some(search) = query.search {
            filter.insert(
                "$or",
                vec![
                    doc! { "title": { "$regex": &search, "$options": "i" } },
                    doc! { "description": { "$regex": &search, "$options": "i" } },
                ],
            );
        }
        let options = FindOptions::builder()
            .sort(doc! { "created_utc": -1 })
            .build();
        let cursor = self.collection.find(filter, options).await?;
        let services: Vec<Service> = cursor.try_collect().await?;
        Ok(services)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError> {
        let mut set = Document::new();
        if let Some(title) = changes.title {
            set.insert("title", title);
        }
        if let Some(description) = changes.description {
            set.insert("description", description);
        }
        if let Some(category) = changes.category {
            set.insert("category", category);
        }
        if let Some(price) = changes.price {
            set.insert("price", price);
        }
        if let Some(image) = changes.image {
            set.insert("image", image);
        }
        if let Some(location) = changes.location {
            set.insert("location", location);
        }
        if let Some(availability) = changes.availability {
            set.insert("availability", availability);
        }
        if set.is_empty() {
            return self.find_by_id(id).await;
        }
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let service = self
            .collection
            .find_one_and_update(doc! { "_id": id.to_string() }, doc! { "$set": set }, options)
            .await?;
        Ok(service)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(result.deleted_count == 1)
    }
}

#[derive(Clone)]
pub struct MongoPayments {
    intents: Collection<PaymentIntent>,
    cards: Collection<SavedCard>,
    wallets: Collection<Wallet>,
    points: Collection<RewardPoints>,
}

impl MongoPayments {
    pub fn new(db: &Database) -> Self {
        Self {
            intents: db.collection("payments"),
            cards: db.collection("saved_cards"),
            wallets: db.collection("wallets"),
            points: db.collection("reward_points"),
        }
    }
}

#[async_trait]
impl PaymentStore for MongoPayments {
    async fn insert_intent(&self, intent: PaymentIntent) -> Result<(), AppError> {
        self.intents.insert_one(intent, None).await?;
        Ok(())
    }

    async fn find_by_order(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        let intent = self
            .intents
            .find_one(
                doc! { "order_id": order_id, "user_id": user_id.to_string() },
                None,
            )
            .await?;
        Ok(intent)
    }

    async fn complete_if_pending(
        &self,
        order_id: &str,
        user_id: Uuid,
    ) -> Result<Option<PaymentIntent>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let intent = self
            .intents
            .find_one_and_update(
                doc! {
                    "order_id": order_id,
                    "user_id": user_id.to_string(),
                    "status": "pending"
                },
                doc! { "$set": {
                    "status": "completed",
                    "updated_utc": bson::to_bson(&Utc::now())?
                }},
                options,
            )
            .await?;
        Ok(intent)
    }

    async fn link_booking(&self, intent_id: Uuid, booking_id: Uuid) -> Result<bool, AppError> {
        let result = self
            .intents
            .update_one(
                doc! {
                    "_id": intent_id.to_string(),
                    "status": "completed",
                    "booking_id": { "$exists": false }
                },
                doc! { "$set": {
                    "booking_id": booking_id.to_string(),
                    "updated_utc": bson::to_bson(&Utc::now())?
                }},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn mark_failed(&self, order_id: &str, user_id: Uuid) -> Result<bool, AppError> {
        let result = self
            .intents
            .update_one(
                doc! {
                    "order_id": order_id,
                    "user_id": user_id.to_string(),
                    "status": "pending"
                },
                doc! { "$set": {
                    "status": "failed",
                    "updated_utc": bson::to_bson(&Utc::now())?
                }},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<PaymentIntent>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "created_utc": -1 })
            .build();
        let cursor = self
            .intents
            .find(doc! { "user_id": user_id.to_string() }, options)
            .await?;
        let intents: Vec<PaymentIntent> = cursor.try_collect().await?;
        Ok(intents)
    }

    async fn save_card(&self, card: SavedCard) -> Result<(), AppError> {
        self.cards.insert_one(card, None).await?;
        Ok(())
    }

    async fn list_cards(&self, user_id: Uuid) -> Result<Vec<SavedCard>, AppError> {
        let cursor = self
            .cards
            .find(doc! { "user_id": user_id.to_string() }, None)
            .await?;
        let cards: Vec<SavedCard> = cursor.try_collect().await?;
        Ok(cards)
    }

    async fn get_wallet(&self, user_id: Uuid) -> Result<Option<Wallet>, AppError> {
        let wallet = self
            .wallets
            .find_one(doc! { "user_id": user_id.to_string() }, None)
            .await?;
        Ok(wallet)
    }

    async fn get_points(&self, user_id: Uuid) -> Result<Option<RewardPoints>, AppError> {
        let points = self
            .points
            .find_one(doc! { "user_id": user_id.to_string() }, None)
            .await?;
        Ok(points)
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
        let options = UpdateOptions::builder().upsert(true).build();
        self.points
            .update_one(
                doc! { "user_id": user_id.to_string() },
                doc! {
                    "$inc": { "points": points },
                    "$push": { "transactions": bson::to_bson(&entry)? },
                    "$setOnInsert": { "_id": Uuid::new_v4().to_string() }
                },
                options,
            )
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct MongoBookings {
    collection: Collection<Booking>,
}

impl MongoBookings {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("bookings"),
        }
    }

    async fn guarded_update(
        &self,
        filter: Document,
        update: Document,
    ) -> Result<Option<Booking>, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let booking = self
            .collection
            .find_one_and_update(filter, update, options)
            .await?;
        Ok(booking)
    }
}

#[async_trait]
impl BookingStore for MongoBookings {
    async fn insert(&self, booking: Booking) -> Result<(), AppError> {
        self.collection.insert_one(booking, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = self
            .collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(booking)
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Booking>, AppError> {
        let booking = self
            .collection
            .find_one(
                doc! { "_id": id.to_string(), "user_id": user_id.to_string() },
                None,
            )
            .await?;
        Ok(booking)
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "booked_utc": -1 })
            .build();
        let cursor = self
            .collection
            .find(doc! { "user_id": user_id.to_string() }, options)
            .await?;
        let bookings: Vec<Booking> = cursor.try_collect().await?;
        Ok(bookings)
    }

    async fn list_all(&self, filter: BookingFilter) -> Result<Vec<Booking>, AppError> {
        let mut query = Document::new();
        if let Some(status) = &filter.status {
            query.insert("status", status);
        }
        let mut schedule = Document::new();
        if let Some(from) = &filter.from_utc {
            schedule.insert("$gte", bson::to_bson(from)?);
        }
        if let Some(to) = &filter.to_utc {
            schedule.insert("$lte", bson::to_bson(to)?);
        }
        if !schedule.is_empty() {
            query.insert("scheduled_utc", schedule);
        }
        let options = FindOptions::builder()
            .sort(doc! { "booked_utc": -1 })
            .skip(filter.skip)
            .limit(filter.limit)
            .build();
        let cursor = self.collection.find(query, options).await?;
        let bookings: Vec<Booking> = cursor.try_collect().await?;
        Ok(bookings)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(result.deleted_count == 1)
    }

    async fn confirm_pending(
        &self,
        id: Uuid,
        agent: AgentSnapshot,
    ) -> Result<Option<Booking>, AppError> {
        self.guarded_update(
            doc! { "_id": id.to_string(), "status": "pending" },
            doc! { "$set": {
                "status": "confirmed",
                "agent": bson::to_bson(&agent)?
            }},
        )
        .await
    }

    async fn cancel_active(
        &self,
        id: Uuid,
        user_scope: Option<Uuid>,
        reason: String,
        cancelled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        let mut filter = doc! { "_id": id.to_string(), "status": active_status_filter() };
        if let Some(user_id) = user_scope {
            filter.insert("user_id", user_id.to_string());
        }
        self.guarded_update(
            filter,
            doc! { "$set": {
                "status": "cancelled",
                "cancellation_reason": reason,
                "cancelled_utc": bson::to_bson(&cancelled_utc)?
            }},
        )
        .await
    }

    async fn reschedule_active(
        &self,
        id: Uuid,
        user_id: Uuid,
        scheduled_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        self.guarded_update(
            doc! {
                "_id": id.to_string(),
                "user_id": user_id.to_string(),
                "status": active_status_filter()
            },
            doc! { "$set": {
                "scheduled_utc": bson::to_bson(&scheduled_utc)?
            }},
        )
        .await
    }

    async fn complete_confirmed(
        &self,
        id: Uuid,
        completed_utc: DateTime<Utc>,
    ) -> Result<Option<Booking>, AppError> {
        self.guarded_update(
            doc! { "_id": id.to_string(), "status": "confirmed" },
            doc! { "$set": {
                "status": "completed",
                "completed_utc": bson::to_bson(&completed_utc)?
            }},
        )
        .await
    }
}

#[derive(Clone)]
pub struct MongoAgents {
    collection: Collection<Agent>,
}

impl MongoAgents {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("agents"),
        }
    }
}

#[async_trait]
impl AgentStore for MongoAgents {
    async fn insert(&self, agent: Agent) -> Result<(), AppError> {
        self.collection.insert_one(agent, None).await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, AppError> {
        let agent = self
            .collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?;
        Ok(agent)
    }

    async fn list(&self, active_only: bool, skill: Option<&str>) -> Result<Vec<Agent>, AppError> {
        let mut filter = Document::new();
        if active_only {
            filter.insert("is_active", true);
        }
        if let Some(skill) = skill {
            filter.insert("skills", skill);
        }
        let options = FindOptions::builder()
            .sort(doc! { "rating": -1, "completed_bookings": -1 })
            .build();
        let cursor = self.collection.find(filter, options).await?;
        let agents: Vec<Agent> = cursor.try_collect().await?;
        Ok(agents)
    }

    async fn record_assignment(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string(), "is_active": true },
                doc! { "$inc": { "total_bookings": 1 } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn release_assignment(&self, id: Uuid) -> Result<bool, AppError> {
        // The counter floor is enforced in the filter, not by the caller.
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string(), "total_bookings": { "$gt": 0 } },
                doc! { "$inc": { "total_bookings": -1 } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn record_completion(&self, id: Uuid) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$inc": { "completed_bookings": 1 } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string() },
                doc! { "$set": { "is_active": active } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }
}

#[derive(Clone)]
pub struct MongoNotifications {
    collection: Collection<Notification>,
}

impl MongoNotifications {
    pub fn new(db: &Database) -> Self {
        Self {
            collection: db.collection("notifications"),
        }
    }
}

#[async_trait]
impl NotificationStore for MongoNotifications {
    async fn insert(&self, notification: Notification) -> Result<(), AppError> {
        self.collection.insert_one(notification, None).await?;
        Ok(())
    }

    async fn mark_sent(&self, id: Uuid, delivered_utc: DateTime<Utc>) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string(), "status": "queued" },
                doc! { "$set": {
                    "status": "sent",
                    "delivered_utc": bson::to_bson(&delivered_utc)?
                }},
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn mark_failed(&self, id: Uuid, reason: String) -> Result<bool, AppError> {
        let result = self
            .collection
            .update_one(
                doc! { "_id": id.to_string(), "status": "queued" },
                doc! { "$set": { "status": "failed", "failure_reason": reason } },
                None,
            )
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn list_for_booking(&self, booking_id: Uuid) -> Result<Vec<Notification>, AppError> {
        let cursor = self
            .collection
            .find(doc! { "booking_id": booking_id.to_string() }, None)
            .await?;
        let notifications: Vec<Notification> = cursor.try_collect().await?;
        Ok(notifications)
    }

    async fn list_for_recipient(&self, recipient: &str) -> Result<Vec<Notification>, AppError> {
        let cursor = self
            .collection
            .find(doc! { "recipient": recipient }, None)
            .await?;
        let notifications: Vec<Notification> = cursor.try_collect().await?;
        Ok(notifications)
    }
}
