//! 健康检查处理器

use axum::Json;
use serde::Serialize;
use std::sync::OnceLock;
use std::time::Instant;

/// 存活探针响应
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

static APP_START_TIME: OnceLock<Instant> = OnceLock::new();

/// 设置应用启动时间
pub fn set_start_time() {
    APP_START_TIME.get_or_init(Instant::now);
}

/// 获取应用运行时间（秒）
pub fn get_uptime() -> u64 {
    APP_START_TIME
        .get()
        .map_or(0, |start| start.elapsed().as_secs())
}

/// 存活探针
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: get_uptime(),
    })
}
