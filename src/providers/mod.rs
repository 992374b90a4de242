//! Remote identity providers (Facebook Graph, Twitter REST)
//!
//! The core only sees [`ProviderClient`]; the HTTP clients live in the
//! submodules.

pub mod facebook;
pub mod twitter;

pub use facebook::FacebookClient;
pub use twitter::TwitterClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Facebook,
    Twitter,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Facebook => f.write_str("facebook"),
            Provider::Twitter => f.write_str("twitter"),
        }
    }
}

/// Profile as returned by the provider, before normalization
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProfile {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Provider-specific format (Facebook uses `MM/DD/YYYY`)
    pub birthday: Option<String>,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Message safe to hand back to the caller
    pub fn user_message(&self) -> String {
        match self {
            ProviderError::Transport(_) => "Unable to reach the identity provider".to_string(),
            ProviderError::Api { message, .. } => message.clone(),
            ProviderError::Decode(_) => "Unexpected response from the identity provider".to_string(),
        }
    }
}

/// Exchanges a provider access token for the user's profile
#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn provider(&self) -> Provider;

    async fn fetch_profile(
        &self,
        token: &str,
        secret: Option<&str>,
    ) -> Result<RawProfile, ProviderError>;
}
