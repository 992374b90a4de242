//! 认证相关的 HTTP 处理器
//! 身份已由认证中间件确定，这里只负责返回结果

use crate::{auth::AuthenticatedUser, models::user::UserResponse};
use axum::{http::StatusCode, response::IntoResponse, Json};

/// 注册（用户已由中间件创建）
pub async fn register(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    (StatusCode::CREATED, Json(UserResponse::from(user)))
}

/// 登录（必要时令牌已被轮换）
pub async fn login(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    Json(UserResponse::from(user))
}

/// 获取当前用户信息
pub async fn me(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
    Json(UserResponse::from(user))
}
