//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{
    auth::{bearer_auth_middleware, request::MAX_BODY_BYTES},
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// 创建应用路由
///
/// action 标识取自路由最后一段：`register`、`login`、`me`。
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new().route("/health", get(handlers::health::health_check));

    // 需要认证的路由
    let authenticated_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/me", get(handlers::auth::me))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            bearer_auth_middleware,
        ));

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_tracking_middleware))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES)),
        )
        .with_state(state)
}
