use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A field agent eligible for booking assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub skills: Vec<String>,
    pub is_active: bool,
    /// Count of bookings currently assigned; never negative.
    pub total_bookings: u32,
    pub completed_bookings: u32,
    pub rating: f64,
    pub created_utc: DateTime<Utc>,
}

impl Agent {
    pub fn new(name: String, email: String, phone: String, skills: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            phone,
            skills,
            is_active: true,
            total_bookings: 0,
            completed_bookings: 0,
            rating: 0.0,
            created_utc: Utc::now(),
        }
    }
}
