//! HTTP 中间件
//! 应用状态与请求追踪

use crate::{
    auth::{AuthDispatcher, PasswordHasher, TokenCodec},
    config::AppConfig,
    error::AppError,
    providers::ProviderClient,
    repository::UserStore,
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<AuthDispatcher>,
}

impl AppState {
    /// 根据配置装配认证分发器
    pub fn new(
        config: &AppConfig,
        store: Arc<dyn UserStore>,
        facebook: Arc<dyn ProviderClient>,
        twitter: Arc<dyn ProviderClient>,
    ) -> Result<Self, AppError> {
        let codec = Arc::new(TokenCodec::from_config(&config.auth)?);
        let hasher = Arc::new(PasswordHasher::from_config(&config.auth)?);

        let dispatcher = Arc::new(AuthDispatcher::new(
            store,
            codec,
            hasher,
            facebook,
            twitter,
            &config.auth,
        ));

        Ok(Self { dispatcher })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    // 生成或提取 trace_id/request_id
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    // 创建 span
    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 记录指标 - 使用静态字符串
        let status_class = match status {
            200..=299 => "2xx",
            400 => "400",
            401 => "401",
            400..=499 => "4xx",
            _ => "5xx",
        };
        metrics::counter!("http_requests_total", "status" => status_class).increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        // 在响应头中添加 trace_id
        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
