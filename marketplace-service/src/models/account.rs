//! Account directory records: customers, providers, agents and admins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
    Agent,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Provider => "provider",
            Role::Agent => "agent",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Password-reset code with a 15 minute window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetCode {
    pub code: String,
    pub expires_utc: DateTime<Utc>,
}

impl ResetCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_utc < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    // Provider-only fields
    #[serde(default)]
    pub service_categories: Vec<String>,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub availability: String,
    #[serde(default)]
    pub hourly_rate: String,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_code: Option<ResetCode>,
    pub created_utc: DateTime<Utc>,
}

impl Account {
    pub fn new(
        name: String,
        email: String,
        password_hash: String,
        phone: String,
        role: Role,
        location: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            email,
            password_hash,
            phone,
            role,
            location,
            avatar: None,
            service_categories: Vec::new(),
            experience: String::new(),
            description: String::new(),
            availability: String::new(),
            hourly_rate: String::new(),
            is_verified: role != Role::Provider,
            reset_code: None,
            created_utc: Utc::now(),
        }
    }

    pub fn sanitized(&self) -> SanitizedAccount {
        SanitizedAccount {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            role: self.role,
            location: self.location.clone(),
            avatar: self.avatar.clone(),
            service_categories: self.service_categories.clone(),
            is_verified: self.is_verified,
        }
    }
}

/// Account view returned by the API; never carries the credential hash or
/// reset code.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service_categories: Vec<String>,
    pub is_verified: bool,
}

/// Fields a profile update may change; `None` leaves the field as-is.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}
