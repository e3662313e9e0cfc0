//! Audit Log API Handlers

use axum::Json;
use axum::extract::{Query, State};

use crate::audit::{AuditEntry, AuditQuery, AuditTarget};
use crate::core::ServerState;
use crate::utils::{AppResponse, AppResult, ok};

/// GET /api/audit-logs/users - 用户管理操作日志（最新在前）
pub async fn user_logs(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AppResponse<Vec<AuditEntry>>>> {
    let entries = state
        .audit
        .query_recent(AuditTarget::User, query.limit)
        .await?;
    Ok(ok(entries))
}

/// GET /api/audit-logs/products - 商品管理操作日志（最新在前）
pub async fn product_logs(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<Json<AppResponse<Vec<AuditEntry>>>> {
    let entries = state
        .audit
        .query_recent(AuditTarget::Product, query.limit)
        .await?;
    Ok(ok(entries))
}
