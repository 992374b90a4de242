//! Authentication dispatcher
//!
//! Stage 1 picks the method from the request headers and applies the action
//! guard. Stage 2 turns the resolved credential into a stored user, creating
//! it on register and rotating stale tokens on login.

use super::{
    credential::Credential,
    method::{check_action, select_method, Action, AuthMethod, EMAIL_PARAM, PASSWORD_PARAM},
    password::PasswordHasher,
    request::{RequestContext, ResponseSink},
    resolver::{CredentialResolver, EmailPasswordResolver, ProviderResolver, TokenResolver},
    token::TokenCodec,
};
use crate::{
    config::AuthConfig,
    error::AuthError,
    models::user::{NewUser, User},
    providers::{Provider, ProviderClient},
    repository::{UserField, UserStore},
};
use std::sync::Arc;

const FULL_NAME_PARAM: &str = "fullName";

/// Per-request authentication state
#[derive(Debug)]
pub struct AuthContext {
    pub action: Action,
    pub method: AuthMethod,
    pub credential: Credential,
}

pub struct AuthDispatcher {
    store: Arc<dyn UserStore>,
    codec: Arc<TokenCodec>,
    hasher: Arc<PasswordHasher>,
    token: TokenResolver,
    email: EmailPasswordResolver,
    facebook: ProviderResolver,
    twitter: ProviderResolver,
    register_action: String,
    login_action: String,
    placeholder_password_length: usize,
}

impl AuthDispatcher {
    pub fn new(
        store: Arc<dyn UserStore>,
        codec: Arc<TokenCodec>,
        hasher: Arc<PasswordHasher>,
        facebook: Arc<dyn ProviderClient>,
        twitter: Arc<dyn ProviderClient>,
        config: &AuthConfig,
    ) -> Self {
        debug_assert_eq!(facebook.provider(), Provider::Facebook);
        debug_assert_eq!(twitter.provider(), Provider::Twitter);

        Self {
            store,
            codec,
            hasher,
            token: TokenResolver,
            email: EmailPasswordResolver,
            facebook: ProviderResolver::new(facebook),
            twitter: ProviderResolver::new(twitter),
            register_action: config.register_action.clone(),
            login_action: config.login_action.clone(),
            placeholder_password_length: config.placeholder_password_length,
        }
    }

    /// Resolve the caller's identity. On failure the status code is set on
    /// `response` and the classified error returned.
    pub async fn authenticate(
        &self,
        request: &dyn RequestContext,
        response: &mut dyn ResponseSink,
    ) -> Result<User, AuthError> {
        let result = self.run(request).await;

        match &result {
            Ok(user) => {
                metrics::counter!("auth_attempts_total", "outcome" => "success").increment(1);
                tracing::debug!(user_id = %user.id, "Request authenticated");
            }
            Err(e) => {
                metrics::counter!("auth_attempts_total", "outcome" => e.kind()).increment(1);
                tracing::warn!(kind = e.kind(), action = request.current_action_id(), "Authentication failed");
                response.set_status_code(e.code());
            }
        }

        result
    }

    async fn run(&self, request: &dyn RequestContext) -> Result<User, AuthError> {
        let action = Action::classify(
            request.current_action_id(),
            &self.register_action,
            &self.login_action,
        );

        let method = select_method(request)?;
        check_action(action, method)?;
        tracing::debug!(%method, ?action, "Authentication method selected");

        let credential = self.resolver(method).resolve(request).await?;
        let context = AuthContext {
            action,
            method,
            credential,
        };

        self.materialize(&context, request)
            .await?
            .ok_or(AuthError::NotFound)
    }

    fn resolver(&self, method: AuthMethod) -> &dyn CredentialResolver {
        match method {
            AuthMethod::Token => &self.token,
            AuthMethod::EmailPassword => &self.email,
            AuthMethod::Facebook => &self.facebook,
            AuthMethod::Twitter => &self.twitter,
        }
    }

    async fn materialize(
        &self,
        context: &AuthContext,
        request: &dyn RequestContext,
    ) -> Result<Option<User>, AuthError> {
        if context.action == Action::Register {
            return self.register(context, request).await.map(Some);
        }

        match &context.credential {
            Credential::Token(token) => self.find_by_token(token).await.map(Some),
            Credential::EmailPassword { email, password } => {
                let Some(user) = self.store.find_by_field(UserField::Email, email).await? else {
                    return Ok(None);
                };

                let hash = user.password.as_deref().unwrap_or_default();
                match password {
                    Some(password) => self.hasher.verify(password, hash)?,
                    None => return Err(AuthError::InvalidPassword),
                }

                self.ensure_current_token(user).await.map(Some)
            }
            // no local account: provider logins do not auto-register
            Credential::ProviderProfile(profile) => {
                match self.store.find_by_field(UserField::Email, &profile.email).await? {
                    Some(user) => self.ensure_current_token(user).await.map(Some),
                    None => Ok(None),
                }
            }
        }
    }

    async fn find_by_token(&self, token: &str) -> Result<User, AuthError> {
        let user = self.store.find_by_field(UserField::Token, token).await?;

        let claims = self.codec.verify(token).map_err(|e| {
            tracing::debug!(cause = %e, "Presented token rejected");
            AuthError::TokenExpiredOrCorrupted
        })?;

        match user {
            Some(user) if user.email.as_deref() == Some(claims.user.as_str()) => Ok(user),
            _ => Err(AuthError::InvalidToken),
        }
    }

    /// Reissue the stored token when it no longer verifies
    async fn ensure_current_token(&self, mut user: User) -> Result<User, AuthError> {
        if self.codec.is_current(user.token.as_deref()) {
            return Ok(user);
        }

        let email = user.email.clone().unwrap_or_default();
        user.token = Some(self.issue(&email)?);
        self.store.update(&user).await?;

        tracing::info!(user_id = %user.id, "Rotated bearer token");
        Ok(user)
    }

    /// Submitted parameters merged with the credential; credential fields win
    async fn register(
        &self,
        context: &AuthContext,
        request: &dyn RequestContext,
    ) -> Result<User, AuthError> {
        let mut attributes = NewUser {
            full_name: request.param(FULL_NAME_PARAM).unwrap_or_default().trim().to_string(),
            email: request.param(EMAIL_PARAM).map(str::to_string),
            password: request.param(PASSWORD_PARAM).map(str::to_string),
            ..Default::default()
        };

        match &context.credential {
            Credential::EmailPassword { email, password } => {
                attributes.email = Some(email.clone());
                if password.is_some() {
                    attributes.password = password.clone();
                }
            }
            Credential::ProviderProfile(profile) => {
                attributes.email = Some(profile.email.clone());
                if !profile.full_name.is_empty() {
                    attributes.full_name = profile.full_name.clone();
                }
                match profile.provider {
                    Provider::Facebook => attributes.facebook_id = Some(profile.provider_id.clone()),
                    Provider::Twitter => attributes.twitter_id = Some(profile.provider_id.clone()),
                }
            }
            Credential::Token(_) => return Err(AuthError::InvalidOperation { method: context.method }),
        }

        let email = context
            .credential
            .email()
            .ok_or(AuthError::MissingEmail(context.method))?;
        attributes.token = Some(self.issue(email)?);

        let password = attributes
            .password
            .take()
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| PasswordHasher::generate_placeholder(self.placeholder_password_length));
        attributes.password = Some(self.hasher.hash(&password)?);

        let user = self.store.create(attributes).await?;
        tracing::info!(user_id = %user.id, method = %context.method, "User registered");

        Ok(user)
    }

    fn issue(&self, email: &str) -> Result<String, AuthError> {
        self.codec
            .issue(email)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }
}
