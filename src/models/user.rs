//! User domain models

use crate::error::FieldErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    /// Argon2 hash, never the raw secret
    pub password: Option<String>,

    // External provider identifiers
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,

    /// Current bearer token; replaced wholesale on rotation
    pub token: Option<String>,

    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Attributes for a new user record
#[derive(Debug, Clone, Default, Validate)]
pub struct NewUser {
    #[validate(length(min = 1, max = 255, message = "Full Name cannot be blank."))]
    pub full_name: String,

    #[validate(
        email(message = "Email is not a valid email address."),
        length(max = 255, message = "Email should contain at most 255 characters.")
    )]
    pub email: Option<String>,

    pub password: Option<String>,

    #[validate(length(max = 32, message = "Facebook Id should contain at most 32 characters."))]
    pub facebook_id: Option<String>,

    #[validate(length(max = 32, message = "Twitter Id should contain at most 32 characters."))]
    pub twitter_id: Option<String>,

    pub token: Option<String>,
}

impl NewUser {
    /// Run attribute rules, collecting failures per field
    pub fn check(&self) -> Result<(), FieldErrors> {
        self.validate().map_err(|errors| {
            let mut fields = FieldErrors::new();
            for (field, errs) in errors.field_errors() {
                fields.insert(
                    field.to_string(),
                    errs.iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect(),
                );
            }
            fields
        })
    }
}

/// User response (without sensitive data)
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub full_name: String,
    pub email: Option<String>,
    pub facebook_id: Option<String>,
    pub twitter_id: Option<String>,
    pub token: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
            facebook_id: user.facebook_id,
            twitter_id: user.twitter_id,
            token: user.token,
            created: user.created,
            updated: user.updated,
        }
    }
}
