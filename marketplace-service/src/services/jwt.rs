use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::Role;

/// Token issuance and validation, HS256 over a shared secret.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    register_expiry_hours: i64,
    login_expiry_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account ID)
    pub sub: String,
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl Claims {
    pub fn account_id(&self) -> Result<Uuid, AppError> {
        Uuid::parse_str(&self.sub)
            .map_err(|_| AppError::unauthorized("Token subject is not a valid account ID"))
    }
}

impl TokenService {
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            register_expiry_hours: config.register_expiry_hours,
            login_expiry_days: config.login_expiry_days,
        }
    }

    /// Short-lived token handed out at registration.
    pub fn issue_registration_token(&self, account_id: Uuid, role: Role) -> Result<String, AppError> {
        self.issue(account_id, role, Duration::hours(self.register_expiry_hours))
    }

    /// Standard session token handed out at login and password reset.
    pub fn issue_login_token(&self, account_id: Uuid, role: Role) -> Result<String, AppError> {
        self.issue(account_id, role, Duration::days(self.login_expiry_days))
    }

    fn issue(&self, account_id: Uuid, role: Role, lifetime: Duration) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: account_id.to_string(),
            role,
            exp: (now + lifetime).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AppError> {
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::Secret;

    fn service() -> TokenService {
        TokenService::new(&JwtConfig {
            secret: Secret::new("test-secret-at-least-32-bytes-long".to_string()),
            register_expiry_hours: 24,
            login_expiry_days: 7,
        })
    }

    #[test]
    fn round_trips_claims() {
        let service = service();
        let account_id = Uuid::new_v4();
        let token = service
            .issue_login_token(account_id, Role::Customer)
            .unwrap();
        let claims = service.validate(&token).unwrap();
        assert_eq!(claims.account_id().unwrap(), account_id);
        assert_eq!(claims.role, Role::Customer);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let other = TokenService::new(&JwtConfig {
            secret: Secret::new("a-completely-different-signing-secret".to_string()),
            register_expiry_hours: 24,
            login_expiry_days: 7,
        });
        let token = other
            .issue_login_token(Uuid::new_v4(), Role::Admin)
            .unwrap();
        assert!(service().validate(&token).is_err());
    }

    #[test]
    fn rejects_garbage() {
        assert!(service().validate("not.a.token").is_err());
    }
}
