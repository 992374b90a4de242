//! 统一错误模型
//! 定义认证失败分类、启动错误以及错误响应格式

use crate::{auth::method::AuthMethod, providers::Provider, repository::StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// 字段级校验错误：字段名 -> 错误消息列表
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// 认证失败分类
///
/// 每种失败都在检测点被分类并作为结果返回，由调用方映射为 HTTP 响应。
#[derive(Debug, Error)]
pub enum AuthError {
    /// 未识别出认证方式，或同时出现多个认证头
    #[error("Ambiguous credentials")]
    AmbiguousCredentials,

    /// 当前 action 不允许使用该认证方式
    #[error("Method {method} is not allowed for this action")]
    InvalidOperation { method: AuthMethod },

    /// 凭据中缺少邮箱（邮箱是关联本地用户的唯一键）
    #[error("No email available from {0} credentials")]
    MissingEmail(AuthMethod),

    /// 第三方提供方调用失败
    #[error("{provider} request failed: {message}")]
    Upstream { provider: Provider, message: String },

    #[error("Token expired or corrupted")]
    TokenExpiredOrCorrupted,

    /// 令牌签名有效，但绑定的邮箱与找到的用户不一致
    #[error("Token does not belong to the user")]
    InvalidToken,

    #[error("Invalid password")]
    InvalidPassword,

    /// 存储层拒绝了提交的属性
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),

    /// 没有匹配的用户
    #[error("No matching user")]
    NotFound,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// 获取 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::AmbiguousCredentials
            | AuthError::InvalidOperation { .. }
            | AuthError::Upstream { .. }
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::MissingEmail(_)
            | AuthError::TokenExpiredOrCorrupted
            | AuthError::InvalidToken
            | AuthError::InvalidPassword
            | AuthError::NotFound => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 机器可读的错误类别，用于日志和指标
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::AmbiguousCredentials => "ambiguous_credentials",
            AuthError::InvalidOperation { .. } => "invalid_operation",
            AuthError::MissingEmail(_) => "missing_email",
            AuthError::Upstream { .. } => "upstream_error",
            AuthError::TokenExpiredOrCorrupted => "token_expired_or_corrupted",
            AuthError::InvalidToken => "invalid_token",
            AuthError::InvalidPassword => "invalid_password",
            AuthError::Validation(_) => "validation_error",
            AuthError::NotFound => "not_found",
            AuthError::Internal(_) => "internal",
        }
    }

    /// 获取用户友好的错误消息（不包含敏感信息）
    pub fn user_message(&self) -> String {
        match self {
            AuthError::AmbiguousCredentials => "Please specify email and password for auth!".to_string(),
            AuthError::InvalidOperation { method: AuthMethod::Token } => {
                "You can't register a new user by token".to_string()
            }
            AuthError::InvalidOperation { .. } => "Invalid Auth credentials, use token!".to_string(),
            AuthError::MissingEmail(AuthMethod::Facebook) => {
                "Please provide an access to your Facebook account!".to_string()
            }
            AuthError::MissingEmail(AuthMethod::Twitter) => {
                "Unable to sign in with your twitter credentials".to_string()
            }
            AuthError::MissingEmail(_) => "Please specify email and password for auth!".to_string(),
            AuthError::Upstream { message, .. } => message.clone(),
            AuthError::TokenExpiredOrCorrupted => "Token was expired or it was corrupted!".to_string(),
            AuthError::InvalidToken => "Invalid token!".to_string(),
            AuthError::InvalidPassword => "Invalid password!".to_string(),
            AuthError::Validation(fields) => fields
                .iter()
                .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
                .collect::<Vec<_>>()
                .join("; "),
            AuthError::NotFound => "Your request was made with invalid credentials.".to_string(),
            AuthError::Internal(_) => "Internal server error".to_string(),
        }
    }

    /// 获取错误码
    pub fn code(&self) -> u16 {
        self.status_code().as_u16()
    }

    /// 错误响应体 `{"error": ...}`，校验错误输出字段映射
    pub fn body(&self) -> serde_json::Value {
        match self {
            AuthError::Validation(fields) => json!({ "error": fields }),
            other => json!({ "error": other.user_message() }),
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Validation(fields) => AuthError::Validation(fields),
            StoreError::Database(e) => {
                tracing::error!(error = %e, "User store failure");
                AuthError::Internal("user store unavailable".to_string())
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), kind = self.kind(), message = %self, "Authentication error");
        } else {
            tracing::warn!(code = self.code(), kind = self.kind(), "Authentication rejected");
        }

        (status, Json(self.body())).into_response()
    }
}

/// 启动与装配阶段的错误
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(AuthError::AmbiguousCredentials.code(), 400);
        assert_eq!(AuthError::InvalidOperation { method: AuthMethod::Token }.code(), 400);
        assert_eq!(AuthError::Validation(FieldErrors::new()).code(), 400);
        assert_eq!(AuthError::MissingEmail(AuthMethod::Facebook).code(), 401);
        assert_eq!(AuthError::TokenExpiredOrCorrupted.code(), 401);
        assert_eq!(AuthError::InvalidToken.code(), 401);
        assert_eq!(AuthError::InvalidPassword.code(), 401);
        assert_eq!(AuthError::NotFound.code(), 401);
        assert_eq!(AuthError::Internal("x".to_string()).code(), 500);
    }

    #[test]
    fn test_body_shape() {
        assert_eq!(
            AuthError::InvalidPassword.body(),
            json!({ "error": "Invalid password!" })
        );

        let mut fields = FieldErrors::new();
        fields.insert("email".to_string(), vec!["has already been taken".to_string()]);
        assert_eq!(
            AuthError::Validation(fields).body(),
            json!({ "error": { "email": ["has already been taken"] } })
        );
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let error = AuthError::from(StoreError::Database(sqlx::Error::RowNotFound));
        assert_eq!(error.kind(), "internal");
        let message = error.user_message();
        assert_eq!(message, "Internal server error");
        assert!(!message.contains("sqlx"));
    }

    #[test]
    fn test_store_validation_maps_to_validation_error() {
        let mut fields = FieldErrors::new();
        fields.insert("full_name".to_string(), vec!["cannot be blank".to_string()]);
        let error = AuthError::from(StoreError::Validation(fields));
        assert!(matches!(error, AuthError::Validation(_)));
        assert_eq!(error.user_message(), "full_name: cannot be blank");
    }
}
