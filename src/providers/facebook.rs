//! Facebook Graph API client

use super::{Provider, ProviderClient, ProviderError, RawProfile};
use crate::config::FacebookConfig;
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha2::Sha256;
use std::time::Duration;

const PROFILE_FIELDS: &str = "id,name,birthday,email";

pub struct FacebookClient {
    http: reqwest::Client,
    app_id: String,
    app_secret: Secret<String>,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GraphUser {
    id: String,
    name: Option<String>,
    email: Option<String>,
    birthday: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    error: GraphError,
}

#[derive(Debug, Deserialize)]
struct GraphError {
    message: String,
}

impl FacebookClient {
    pub fn new(config: &FacebookConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            app_id: config.app_id.clone(),
            app_secret: config.app_secret.clone(),
            base_url: format!(
                "{}/{}",
                config.graph_url.trim_end_matches('/'),
                config.graph_version
            ),
        })
    }

    /// HMAC-SHA256 of the access token keyed by the app secret, hex encoded.
    /// `None` when no app secret is configured.
    pub fn appsecret_proof(&self, token: &str) -> Result<Option<String>, ProviderError> {
        let secret = self.app_secret.expose_secret();
        if secret.is_empty() {
            return Ok(None);
        }

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| ProviderError::Decode(format!("invalid app secret: {}", e)))?;
        mac.update(token.as_bytes());

        Ok(Some(hex::encode(mac.finalize().into_bytes())))
    }
}

#[async_trait]
impl ProviderClient for FacebookClient {
    fn provider(&self) -> Provider {
        Provider::Facebook
    }

    async fn fetch_profile(
        &self,
        token: &str,
        _secret: Option<&str>,
    ) -> Result<RawProfile, ProviderError> {
        let mut query = vec![
            ("fields", PROFILE_FIELDS.to_string()),
            ("access_token", token.to_string()),
        ];
        if let Some(proof) = self.appsecret_proof(token)? {
            query.push(("appsecret_proof", proof));
        }

        tracing::debug!(app_id = %self.app_id, "Fetching Facebook profile");

        let response = self
            .http
            .get(format!("{}/me", self.base_url))
            .query(&query)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<GraphErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| format!("Graph API returned {}", status));
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: GraphUser =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(RawProfile {
            id: user.id,
            name: user.name,
            email: user.email,
            birthday: user.birthday,
        })
    }
}
