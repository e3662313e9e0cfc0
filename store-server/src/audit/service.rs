//! 审计日志服务
//!
//! `AuditService::record` 只负责把请求投递到有界通道，写库由后台
//! worker 完成。投递失败（通道满/已关闭）返回错误值，调用方记录到
//! 运行日志后继续 — 审计失败永远不会让主操作失败。

use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use super::storage::{AuditStorage, AuditStorageResult};
use super::types::{AuditAction, AuditEntry, AuditTarget};

/// 发送到后台 worker 的日志请求
#[derive(Debug)]
pub struct AuditLogRequest {
    pub action: AuditAction,
    pub performed_by: String,
    pub target_id: String,
    pub detail: String,
}

/// 投递错误 — 调用方检视后记录 tracing，不向请求方传播
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuditEnqueueError {
    #[error("Audit channel is full, entry dropped")]
    ChannelFull,

    #[error("Audit channel is closed, entry dropped")]
    ChannelClosed,
}

/// 审计日志服务
#[derive(Debug)]
pub struct AuditService {
    storage: AuditStorage,
    tx: mpsc::Sender<AuditLogRequest>,
}

impl AuditService {
    /// 创建服务和 worker 消费端
    pub fn new(
        db: Surreal<Db>,
        buffer_size: usize,
    ) -> (Arc<Self>, mpsc::Receiver<AuditLogRequest>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        let storage = AuditStorage::new(db);
        let service = Arc::new(Self { storage, tx });
        (service, rx)
    }

    /// 非阻塞投递一条审计日志
    ///
    /// 通道满时立即返回错误而不是等待，管理请求不为审计排队。
    pub fn record(
        &self,
        action: AuditAction,
        performed_by: impl Into<String>,
        target_id: impl Into<String>,
        detail: impl Into<String>,
    ) -> Result<(), AuditEnqueueError> {
        let req = AuditLogRequest {
            action,
            performed_by: performed_by.into(),
            target_id: target_id.into(),
            detail: detail.into(),
        };

        self.tx.try_send(req).map_err(|e| match e {
            TrySendError::Full(_) => AuditEnqueueError::ChannelFull,
            TrySendError::Closed(_) => AuditEnqueueError::ChannelClosed,
        })
    }

    /// 查询某张日志表的最近条目
    pub async fn query_recent(
        &self,
        target: AuditTarget,
        limit: usize,
    ) -> AuditStorageResult<Vec<AuditEntry>> {
        self.storage.query_recent(target, limit).await
    }

    /// 获取存储引用
    pub fn storage(&self) -> &AuditStorage {
        &self.storage
    }
}
