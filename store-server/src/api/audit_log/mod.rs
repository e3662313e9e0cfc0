//! Audit Log API 模块
//!
//! 两条追加日志的只读查询接口，仅限管理员。

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .nest("/api/audit-logs", audit_routes())
        .layer(middleware::from_fn(require_admin))
}

fn audit_routes() -> Router<ServerState> {
    Router::new()
        .route("/users", get(handler::user_logs))
        .route("/products", get(handler::product_logs))
}
