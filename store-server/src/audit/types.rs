//! 审计日志类型定义
//!
//! 管理操作的事实记录。条目一经写入不可变更、不可删除。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 审计操作类型（枚举，非自由文本）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    // ═══ 账户管理 ═══
    /// 管理员创建账户
    UserCreated,
    /// 账户更新（改名/改角色）
    UserUpdated,
    /// 账户删除
    UserDeleted,

    // ═══ 商品管理 ═══
    /// 商品创建
    ProductCreated,
    /// 商品更新
    ProductUpdated,
    /// 商品删除
    ProductDeleted,
}

impl AuditAction {
    /// 每个操作固定归属一张日志表，写错表在类型层面即不可能
    pub fn target(&self) -> AuditTarget {
        match self {
            AuditAction::UserCreated | AuditAction::UserUpdated | AuditAction::UserDeleted => {
                AuditTarget::User
            }
            AuditAction::ProductCreated
            | AuditAction::ProductUpdated
            | AuditAction::ProductDeleted => AuditTarget::Product,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// 审计目标实体 — 决定写入哪张日志表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditTarget {
    User,
    Product,
}

impl AuditTarget {
    pub fn table_name(&self) -> &'static str {
        match self {
            AuditTarget::User => "user_audit_log",
            AuditTarget::Product => "product_audit_log",
        }
    }
}

/// 审计日志条目（不可变）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// 操作类型
    pub action: AuditAction,
    /// 操作人（管理员显示名）
    pub performed_by: String,
    /// 目标实体 ID（"user:xxx" / "product:yyy"）
    pub target_id: String,
    /// 自由文本详情
    pub detail: String,
    /// 写入时间（UTC）
    pub created_at: DateTime<Utc>,
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    /// 返回条数（默认 50，超出范围会被收紧）
    #[serde(default = "default_limit")]
    pub limit: usize,
}

impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            limit: default_limit(),
        }
    }
}

fn default_limit() -> usize {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_maps_to_its_log_table() {
        assert_eq!(AuditAction::UserDeleted.target(), AuditTarget::User);
        assert_eq!(AuditAction::ProductUpdated.target(), AuditTarget::Product);
        assert_eq!(AuditTarget::User.table_name(), "user_audit_log");
        assert_eq!(AuditTarget::Product.table_name(), "product_audit_log");
    }

    #[test]
    fn test_action_serializes_snake_case() {
        let json = serde_json::to_string(&AuditAction::ProductCreated).unwrap();
        assert_eq!(json, "\"product_created\"");
    }

    #[test]
    fn test_query_limit_defaults_to_50() {
        let q: AuditQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, 50);
    }
}
