//! 审计日志 SurrealDB 存储层
//!
//! Append-only 设计，没有任何删除/更新接口。
//! 两张日志表（`user_audit_log` / `product_audit_log`）按目标实体分流。

use chrono::{DateTime, Utc};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;

use super::types::{AuditAction, AuditEntry, AuditTarget};
use crate::utils::AppError;

/// 单次查询允许的最大条数
const MAX_QUERY_LIMIT: usize = 200;

/// 存储错误
#[derive(Debug, Error)]
pub enum AuditStorageError {
    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for AuditStorageError {
    fn from(err: surrealdb::Error) -> Self {
        AuditStorageError::Database(err.to_string())
    }
}

pub type AuditStorageResult<T> = Result<T, AuditStorageError>;

impl From<AuditStorageError> for AppError {
    fn from(err: AuditStorageError) -> Self {
        AppError::internal(err.to_string())
    }
}

/// SurrealDB 反序列化用（包含 SurrealDB record id）
#[derive(Debug, Clone, serde::Deserialize)]
struct AuditRecord {
    #[allow(dead_code)]
    id: surrealdb::RecordId,
    action: AuditAction,
    performed_by: String,
    target_id: String,
    detail: String,
    created_at: DateTime<Utc>,
}

impl From<AuditRecord> for AuditEntry {
    fn from(r: AuditRecord) -> Self {
        AuditEntry {
            action: r.action,
            performed_by: r.performed_by,
            target_id: r.target_id,
            detail: r.detail,
            created_at: r.created_at,
        }
    }
}

/// 插入用结构（不含 SurrealDB id）
#[derive(Debug, serde::Serialize)]
struct AuditInsert {
    action: AuditAction,
    performed_by: String,
    target_id: String,
    detail: String,
    created_at: DateTime<Utc>,
}

/// 审计日志存储 (SurrealDB)
///
/// 仅提供 `append` 和 `query_recent`，没有 delete/update 接口。
#[derive(Debug, Clone)]
pub struct AuditStorage {
    db: Surreal<Db>,
}

impl AuditStorage {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// 追加一条审计日志，表由 `action.target()` 决定
    pub async fn append(
        &self,
        action: AuditAction,
        performed_by: String,
        target_id: String,
        detail: String,
    ) -> AuditStorageResult<AuditEntry> {
        let created_at = Utc::now();

        let entry = AuditEntry {
            action,
            performed_by: performed_by.clone(),
            target_id: target_id.clone(),
            detail: detail.clone(),
            created_at,
        };

        let insert = AuditInsert {
            action,
            performed_by,
            target_id,
            detail,
            created_at,
        };

        // bind 需要 'static，传 owned
        let sql = format!("CREATE {} CONTENT $data", action.target().table_name());
        let mut res = self.db.query(sql).bind(("data", insert)).await?;
        let _: Vec<AuditRecord> = res.take(0)?;

        Ok(entry)
    }

    /// 查询某张日志表的最近 N 条（倒序）
    pub async fn query_recent(
        &self,
        target: AuditTarget,
        limit: usize,
    ) -> AuditStorageResult<Vec<AuditEntry>> {
        let limit = limit.clamp(1, MAX_QUERY_LIMIT);
        let sql = format!(
            "SELECT * FROM {} ORDER BY created_at DESC LIMIT {}",
            target.table_name(),
            limit
        );

        let mut result = self.db.query(sql).await?;
        let records: Vec<AuditRecord> = result.take(0)?;

        Ok(records.into_iter().map(AuditEntry::from).collect())
    }
}
