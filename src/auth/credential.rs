//! Normalized credentials produced by the resolvers

use crate::providers::Provider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Token(String),
    EmailPassword {
        email: String,
        password: Option<String>,
    },
    ProviderProfile(ProviderProfile),
}

/// Remote profile reduced to the fields the user store cares about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderProfile {
    pub provider: Provider,
    pub provider_id: String,
    pub email: String,
    pub full_name: String,
    /// `YYYY-MM-DD`
    pub birthday: Option<String>,
}

impl Credential {
    pub fn email(&self) -> Option<&str> {
        match self {
            Credential::Token(_) => None,
            Credential::EmailPassword { email, .. } => Some(email),
            Credential::ProviderProfile(profile) => Some(&profile.email),
        }
    }
}
