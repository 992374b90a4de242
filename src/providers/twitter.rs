//! Twitter REST client, OAuth 1.0a (HMAC-SHA1) signed

use super::{Provider, ProviderClient, ProviderError, RawProfile};
use crate::config::TwitterConfig;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use sha1::Sha1;
use std::time::Duration;

/// RFC 3986 unreserved characters stay as-is
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

const VERIFY_QUERY: [(&str, &str); 2] = [("include_email", "true"), ("include_entities", "true")];

pub struct TwitterClient {
    http: reqwest::Client,
    consumer_key: String,
    consumer_secret: Secret<String>,
    api_url: String,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id_str: String,
    name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TwitterErrorBody {
    errors: Vec<TwitterError>,
}

#[derive(Debug, Deserialize)]
struct TwitterError {
    message: String,
}

/// Per-request OAuth values
pub struct OAuthRequest<'a> {
    pub method: &'a str,
    pub url: &'a str,
    pub params: &'a [(&'a str, &'a str)],
    pub token: &'a str,
    pub token_secret: &'a str,
    pub nonce: &'a str,
    pub timestamp: i64,
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

impl TwitterClient {
    pub fn new(config: &TwitterConfig) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn oauth_params<'a>(&'a self, request: &'a OAuthRequest<'a>, timestamp: &'a str) -> Vec<(&'a str, &'a str)> {
        vec![
            ("oauth_consumer_key", self.consumer_key.as_str()),
            ("oauth_nonce", request.nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", request.token),
            ("oauth_version", "1.0"),
        ]
    }

    /// Signature base string: `METHOD&url&sorted-params`, each part percent-encoded
    pub fn signature_base(&self, request: &OAuthRequest<'_>) -> String {
        let timestamp = request.timestamp.to_string();

        let mut pairs: Vec<(String, String)> = request
            .params
            .iter()
            .chain(self.oauth_params(request, &timestamp).iter())
            .map(|(k, v)| (encode(k), encode(v)))
            .collect();
        pairs.sort();

        let normalized = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&");

        format!(
            "{}&{}&{}",
            request.method.to_uppercase(),
            encode(request.url),
            encode(&normalized)
        )
    }

    pub fn sign(&self, request: &OAuthRequest<'_>) -> Result<String, ProviderError> {
        let key = format!(
            "{}&{}",
            encode(self.consumer_secret.expose_secret()),
            encode(request.token_secret)
        );

        let mut mac = Hmac::<Sha1>::new_from_slice(key.as_bytes())
            .map_err(|e| ProviderError::Decode(format!("invalid signing key: {}", e)))?;
        mac.update(self.signature_base(request).as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// `Authorization: OAuth ...` header value
    pub fn authorization_header(&self, request: &OAuthRequest<'_>) -> Result<String, ProviderError> {
        let signature = self.sign(request)?;
        let timestamp = request.timestamp.to_string();

        let mut fields = self.oauth_params(request, &timestamp);
        fields.push(("oauth_signature", signature.as_str()));
        fields.sort();

        let header = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", header))
    }
}

#[async_trait]
impl ProviderClient for TwitterClient {
    fn provider(&self) -> Provider {
        Provider::Twitter
    }

    async fn fetch_profile(
        &self,
        token: &str,
        secret: Option<&str>,
    ) -> Result<RawProfile, ProviderError> {
        let url = format!("{}/account/verify_credentials.json", self.api_url);
        let nonce: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();

        let header = self.authorization_header(&OAuthRequest {
            method: "GET",
            url: &url,
            params: &VERIFY_QUERY,
            token,
            token_secret: secret.unwrap_or_default(),
            nonce: &nonce,
            timestamp: chrono::Utc::now().timestamp(),
        })?;

        let response = self
            .http
            .get(&url)
            .query(&VERIFY_QUERY)
            .header(reqwest::header::AUTHORIZATION, header)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = match serde_json::from_slice::<TwitterErrorBody>(&body) {
                Ok(b) => {
                    let messages: Vec<String> = b.errors.into_iter().map(|e| e.message).collect();
                    tracing::info!(errors = ?messages, "Twitter error");
                    messages
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| format!("Twitter API returned {}", status))
                }
                Err(_) => format!("Twitter API returned {}", status),
            };
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let user: TwitterUser =
            serde_json::from_slice(&body).map_err(|e| ProviderError::Decode(e.to_string()))?;

        if user.email.is_none() {
            tracing::info!("Twitter email not found in response");
        }

        Ok(RawProfile {
            id: user.id_str,
            name: user.name,
            email: user.email,
            birthday: None,
        })
    }
}
