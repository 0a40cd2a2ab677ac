//! Google sign-in: the client's ID token is checked against Google's
//! tokeninfo endpoint and the audience must match our client ID.

use serde::Deserialize;
use service_core::error::AppError;

const TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Debug, Deserialize)]
pub struct GoogleProfile {
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    aud: String,
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client: reqwest::Client,
    client_id: Option<String>,
}

impl GoogleVerifier {
    pub fn new(client_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            client_id,
        }
    }

    pub async fn verify(&self, id_token: &str) -> Result<GoogleProfile, AppError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or_else(|| AppError::bad_request("Google sign-in is not configured"))?;

        let response = self
            .client
            .get(TOKENINFO_URL)
            .query(&[("id_token", id_token)])
            .send()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("tokeninfo request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::unauthorized("Invalid Google token"));
        }

        let profile: GoogleProfile = response
            .json()
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("tokeninfo parse failed: {}", e)))?;

        if profile.aud != client_id {
            return Err(AppError::unauthorized("Google token audience mismatch"));
        }

        Ok(profile)
    }
}
