//! Credential resolvers, one per authentication method
//!
//! Resolvers only read and normalize; the action guard has already run.

use super::{
    credential::{Credential, ProviderProfile},
    method::{AuthMethod, AUTHORIZATION, EMAIL_PARAM, PASSWORD_PARAM, TWITTER_TOKEN_SECRET},
    request::RequestContext,
};
use crate::{
    error::AuthError,
    providers::{Provider, ProviderClient, RawProfile},
};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, request: &dyn RequestContext) -> Result<Credential, AuthError>;
}

/// Reads the bearer token from `authorization`
pub struct TokenResolver;

#[async_trait]
impl CredentialResolver for TokenResolver {
    async fn resolve(&self, request: &dyn RequestContext) -> Result<Credential, AuthError> {
        let value = request.header(AUTHORIZATION).unwrap_or_default().trim();
        let token = match value.get(..7) {
            Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim_start(),
            _ => value,
        };

        Ok(Credential::Token(token.to_string()))
    }
}

/// Reads `email`/`password` request parameters
pub struct EmailPasswordResolver;

#[async_trait]
impl CredentialResolver for EmailPasswordResolver {
    async fn resolve(&self, request: &dyn RequestContext) -> Result<Credential, AuthError> {
        let email = request
            .param(EMAIL_PARAM)
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or(AuthError::MissingEmail(AuthMethod::EmailPassword))?;

        let password = request
            .param(PASSWORD_PARAM)
            .filter(|p| !p.is_empty())
            .map(str::to_string);

        Ok(Credential::EmailPassword {
            email: email.to_string(),
            password,
        })
    }
}

/// Exchanges a Facebook or Twitter access token for a profile
pub struct ProviderResolver {
    client: Arc<dyn ProviderClient>,
}

impl ProviderResolver {
    pub fn new(client: Arc<dyn ProviderClient>) -> Self {
        Self { client }
    }

    fn method(&self) -> AuthMethod {
        match self.client.provider() {
            Provider::Facebook => AuthMethod::Facebook,
            Provider::Twitter => AuthMethod::Twitter,
        }
    }
}

#[async_trait]
impl CredentialResolver for ProviderResolver {
    async fn resolve(&self, request: &dyn RequestContext) -> Result<Credential, AuthError> {
        let provider = self.client.provider();
        let method = self.method();

        let token = request.header(method.header()).unwrap_or_default();
        let secret = match provider {
            Provider::Twitter => request.header(TWITTER_TOKEN_SECRET),
            Provider::Facebook => None,
        };

        let raw = self.client.fetch_profile(token, secret).await.map_err(|e| {
            tracing::warn!(%provider, error = %e, "Provider profile request failed");
            AuthError::Upstream {
                provider,
                message: e.user_message(),
            }
        })?;

        normalize_profile(provider, raw).map(Credential::ProviderProfile)
    }
}

/// Reduce a raw provider profile; email is mandatory since it joins to the local user
pub fn normalize_profile(provider: Provider, raw: RawProfile) -> Result<ProviderProfile, AuthError> {
    let method = match provider {
        Provider::Facebook => AuthMethod::Facebook,
        Provider::Twitter => AuthMethod::Twitter,
    };

    let email = raw
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .ok_or(AuthError::MissingEmail(method))?;

    Ok(ProviderProfile {
        provider,
        provider_id: raw.id,
        email,
        full_name: raw.name.unwrap_or_default(),
        birthday: raw.birthday.as_deref().and_then(normalize_birthday),
    })
}

/// `MM/DD/YYYY` (Facebook) or ISO dates become `YYYY-MM-DD`; partial dates are dropped
pub fn normalize_birthday(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y-%m-%d"))
        .ok()
        .map(|d| d.format("%Y-%m-%d").to_string())
}
