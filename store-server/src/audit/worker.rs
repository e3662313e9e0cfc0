//! 审计日志后台 Worker
//!
//! 从 mpsc 通道消费 AuditLogRequest，写入 SurrealDB。
//! 收到关闭信号时先排空已入队的请求再退出。

use tokio_util::sync::CancellationToken;

use super::service::AuditLogRequest;
use super::storage::AuditStorage;

/// 审计日志后台 Worker
pub struct AuditWorker {
    storage: AuditStorage,
    shutdown: CancellationToken,
}

impl AuditWorker {
    pub fn new(storage: AuditStorage, shutdown: CancellationToken) -> Self {
        Self { storage, shutdown }
    }

    /// 运行 worker（阻塞直到通道关闭或收到关闭信号）
    pub async fn run(self, mut rx: tokio::sync::mpsc::Receiver<AuditLogRequest>) {
        tracing::info!("Audit log worker started");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Audit worker shutting down, draining queue");
                    rx.close();
                    while let Ok(req) = rx.try_recv() {
                        self.write(req).await;
                    }
                    break;
                }

                req = rx.recv() => {
                    match req {
                        Some(req) => self.write(req).await,
                        None => {
                            tracing::info!("Audit log channel closed, worker stopping");
                            break;
                        }
                    }
                }
            }
        }

        tracing::info!("Audit log worker stopped");
    }

    async fn write(&self, req: AuditLogRequest) {
        match self
            .storage
            .append(req.action, req.performed_by, req.target_id, req.detail)
            .await
        {
            Ok(entry) => {
                tracing::debug!(
                    action = %entry.action,
                    target = %entry.target_id,
                    "Audit entry recorded"
                );
            }
            Err(e) => {
                tracing::error!("Failed to write audit entry: {:?}", e);
            }
        }
    }
}
