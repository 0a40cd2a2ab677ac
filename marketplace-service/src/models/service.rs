//! Catalog entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    /// Non-negative; snapshotted onto bookings at creation time.
    pub price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub provider_id: Uuid,
    pub location: String,
    pub rating: f64,
    pub reviews: i64,
    pub availability: bool,
    pub created_utc: DateTime<Utc>,
}

impl Service {
    pub fn new(
        title: String,
        description: String,
        category: String,
        price: f64,
        image: Option<String>,
        provider_id: Uuid,
        location: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            category,
            price,
            image,
            provider_id,
            location,
            rating: 0.0,
            reviews: 0,
            availability: true,
            created_utc: Utc::now(),
        }
    }
}

/// Partial update applied by the owning provider or an admin.
#[derive(Debug, Clone, Default)]
pub struct ServiceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub location: Option<String>,
    pub availability: Option<bool>,
}
