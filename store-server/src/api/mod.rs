//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`auth`] - 注册、邮箱验证、登录、OTP 校验
//! - [`products`] - 商品目录与评论
//! - [`users`] - 用户管理接口
//! - [`orders`] - 下单、配送流转、订单跟踪
//! - [`rider`] - 骑手位置查询
//! - [`audit_log`] - 审计日志查询接口

pub mod auth;
pub mod health;

// Data models API
pub mod products;
pub mod users;
pub mod orders;

// Delivery & operations API
pub mod rider;
pub mod audit_log;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};
