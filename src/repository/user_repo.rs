//! User repository (数据库访问层)

use super::{StoreError, UserField, UserStore};
use crate::{error::FieldErrors, models::user::*};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const EMAIL_UNIQUE_CONSTRAINT: &str = "users_email_key";

pub struct UserRepository {
    db: PgPool,
}

impl UserRepository {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// 将唯一约束冲突转换为字段错误
    fn map_write_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(EMAIL_UNIQUE_CONSTRAINT) => "email",
                    _ => "id",
                };
                let mut fields = FieldErrors::new();
                fields.insert(field.to_string(), vec!["has already been taken.".to_string()]);
                return StoreError::Validation(fields);
            }
        }
        StoreError::Database(e)
    }
}

#[async_trait]
impl UserStore for UserRepository {
    /// 根据字段查找用户
    async fn find_by_field(&self, field: UserField, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT * FROM users WHERE {} = $1 LIMIT 1", field.column());

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;

        Ok(user)
    }

    /// 创建用户
    async fn create(&self, attributes: NewUser) -> Result<User, StoreError> {
        attributes.check().map_err(StoreError::Validation)?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, full_name, email, password, facebook_id, twitter_id, token)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#
        )
        .bind(Uuid::new_v4())
        .bind(&attributes.full_name)
        .bind(&attributes.email)
        .bind(&attributes.password)
        .bind(&attributes.facebook_id)
        .bind(&attributes.twitter_id)
        .bind(&attributes.token)
        .fetch_one(&self.db)
        .await
        .map_err(Self::map_write_error)?;

        Ok(user)
    }

    /// 更新用户
    async fn update(&self, user: &User) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET
                full_name = $2,
                email = $3,
                password = $4,
                facebook_id = $5,
                twitter_id = $6,
                token = $7,
                updated = NOW()
            WHERE id = $1
            "#
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.facebook_id)
        .bind(&user.twitter_id)
        .bind(&user.token)
        .execute(&self.db)
        .await
        .map_err(Self::map_write_error)?;

        if result.rows_affected() == 0 {
            let mut fields = FieldErrors::new();
            fields.insert("id".to_string(), vec!["User no longer exists.".to_string()]);
            return Err(StoreError::Validation(fields));
        }

        Ok(())
    }
}
