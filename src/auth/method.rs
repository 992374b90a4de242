//! Authentication method selection and the per-action guard

use super::request::RequestContext;
use crate::error::AuthError;
use serde::Serialize;
use std::fmt;

pub const AUTHORIZATION: &str = "authorization";
pub const FACEBOOK_AUTHORIZATION: &str = "facebook-authorization";
pub const TWITTER_AUTHORIZATION: &str = "twitter-authorization";
pub const EMAIL_AUTHORIZATION: &str = "email-authorization";
pub const TWITTER_TOKEN_SECRET: &str = "twitter-token-secret";

pub const EMAIL_PARAM: &str = "email";
pub const PASSWORD_PARAM: &str = "password";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Token,
    EmailPassword,
    Facebook,
    Twitter,
}

/// Recognized headers, in order, and the method each one selects
pub const AUTH_HEADERS: [(&str, AuthMethod); 4] = [
    (AUTHORIZATION, AuthMethod::Token),
    (FACEBOOK_AUTHORIZATION, AuthMethod::Facebook),
    (TWITTER_AUTHORIZATION, AuthMethod::Twitter),
    (EMAIL_AUTHORIZATION, AuthMethod::EmailPassword),
];

impl AuthMethod {
    pub fn header(self) -> &'static str {
        match self {
            AuthMethod::Token => AUTHORIZATION,
            AuthMethod::EmailPassword => EMAIL_AUTHORIZATION,
            AuthMethod::Facebook => FACEBOOK_AUTHORIZATION,
            AuthMethod::Twitter => TWITTER_AUTHORIZATION,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthMethod::Token => "token",
            AuthMethod::EmailPassword => "email_password",
            AuthMethod::Facebook => "facebook",
            AuthMethod::Twitter => "twitter",
        }
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the current request is trying to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Register,
    Login,
    Other,
}

impl Action {
    pub fn classify(action_id: &str, register_action: &str, login_action: &str) -> Self {
        if action_id == register_action {
            Action::Register
        } else if action_id == login_action {
            Action::Login
        } else {
            Action::Other
        }
    }
}

fn has_param(request: &dyn RequestContext, name: &str) -> bool {
    request.param(name).is_some_and(|v| !v.is_empty())
}

/// Pick exactly one method from the recognized header names, falling back to
/// email/password parameters when no header is present.
pub fn select_method(request: &dyn RequestContext) -> Result<AuthMethod, AuthError> {
    let present: Vec<AuthMethod> = AUTH_HEADERS
        .iter()
        .filter(|(name, _)| request.has_header(name))
        .map(|(_, method)| *method)
        .collect();

    match present.as_slice() {
        [method] => Ok(*method),
        [] if has_param(request, EMAIL_PARAM) && has_param(request, PASSWORD_PARAM) => {
            Ok(AuthMethod::EmailPassword)
        }
        _ => Err(AuthError::AmbiguousCredentials),
    }
}

/// Tokens cannot register; every other method is limited to register/login
pub fn check_action(action: Action, method: AuthMethod) -> Result<(), AuthError> {
    let allowed = match method {
        AuthMethod::Token => action != Action::Register,
        AuthMethod::EmailPassword | AuthMethod::Facebook | AuthMethod::Twitter => {
            matches!(action, Action::Register | Action::Login)
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(AuthError::InvalidOperation { method })
    }
}
