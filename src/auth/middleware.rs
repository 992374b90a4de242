//! 认证中间件

use super::request::{HttpRequestContext, StatusSink};
use crate::{error::AuthError, middleware::AppState, models::user::User};
use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;

/// 已认证的用户（附加到请求扩展）
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthenticatedUser
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AuthError::NotFound)
    }
}

/// 认证中间件 - 必须认证
pub async fn bearer_auth_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Response {
    let (context, mut req) = match HttpRequestContext::from_request(req).await {
        Ok(pair) => pair,
        Err(response) => return response,
    };

    let mut sink = StatusSink::default();
    match state.dispatcher.authenticate(&context, &mut sink).await {
        Ok(user) => {
            // 附加到请求扩展
            req.extensions_mut().insert(AuthenticatedUser(user));
            next.run(req).await
        }
        Err(e) => {
            let status = sink.status().unwrap_or_else(|| e.status_code());
            (status, Json(e.body())).into_response()
        }
    }
}
