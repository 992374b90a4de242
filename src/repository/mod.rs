//! Database repository layer

pub mod user_repo;

pub use user_repo::UserRepository;

use crate::{error::FieldErrors, models::user::*};
use async_trait::async_trait;
use thiserror::Error;

/// Columns a user can be looked up by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Email,
    Token,
    FacebookId,
    TwitterId,
}

impl UserField {
    pub fn column(self) -> &'static str {
        match self {
            UserField::Email => "email",
            UserField::Token => "token",
            UserField::FacebookId => "facebook_id",
            UserField::TwitterId => "twitter_id",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// Attributes rejected by the store's rules
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// User records store
///
/// Each call is atomic; a failed `create` leaves no partial record.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_field(&self, field: UserField, value: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, attributes: NewUser) -> Result<User, StoreError>;

    async fn update(&self, user: &User) -> Result<(), StoreError>;
}
