//! 健康检查 Handlers

use axum::Json;
use serde::Serialize;
use std::time::SystemTime;

use crate::utils::{AppResponse, ok};

/// 健康检查响应
#[derive(Serialize)]
pub struct HealthStatus {
    /// 状态 (healthy | degraded)
    status: &'static str,
    /// 版本号
    version: &'static str,
    /// 运行时间 (秒)
    uptime_seconds: u64,
}

// 服务器启动时间 (懒加载静态变量)
static START_TIME: std::sync::OnceLock<SystemTime> = std::sync::OnceLock::new();

fn uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(SystemTime::now);
    SystemTime::now()
        .duration_since(*start)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// GET /api/health - 存活探针
pub async fn health() -> Json<AppResponse<HealthStatus>> {
    ok(HealthStatus {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        uptime_seconds: uptime_seconds(),
    })
}
