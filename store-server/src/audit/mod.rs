//! 审计日志模块 — 管理操作的追加式日志
//!
//! # 架构
//!
//! ```text
//! 管理操作（商品/账户增删改）
//!   └─ AuditService::record() → mpsc（有界）→ AuditWorker → SurrealDB
//!        user_audit_log / product_audit_log（按目标实体分表）
//! ```
//!
//! # 保证
//!
//! - **Append-only**: 无删除/更新接口
//! - **Best-effort**: 投递失败返回错误值，调用方记 tracing 后继续，
//!   绝不让主操作失败或回滚
//! - **有序关闭**: worker 收到 CancellationToken 后排空队列再退出

pub mod service;
pub mod storage;
pub mod types;
pub mod worker;

pub use service::{AuditEnqueueError, AuditLogRequest, AuditService};
pub use storage::{AuditStorage, AuditStorageError};
pub use types::{AuditAction, AuditEntry, AuditQuery, AuditTarget};
pub use worker::AuditWorker;
