//! Store Server - 腕表电商店面后端
//!
//! # 架构概述
//!
//! 本模块是店面后端的主入口，提供以下核心功能：
//!
//! - **商品目录** (`api/products`): 闭集品牌、内嵌评论
//! - **订单** (`api/orders`): 事务下单、Pending → Delivering → Delivered 流转
//! - **认证** (`auth`): 邮箱验证 + OTP 两步登录、JWT + Argon2
//! - **审计** (`audit`): 用户/商品两条追加日志，后台 worker 落盘
//! - **位置推送** (`tracking`): Socket.IO 广播骑手坐标
//! - **邮件** (`email`): 验证链接与一次性验证码投递
//!
//! # 模块结构
//!
//! ```text
//! store-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── api/           # HTTP 路由和处理器
//! ├── auth/          # JWT、OTP、认证中间件
//! ├── db/            # 嵌入式 SurrealDB、模型、仓储
//! ├── audit/         # 审计日志管道
//! ├── tracking/      # 骑手位置 feed + Socket.IO
//! ├── email/         # Mailer trait 与 SMTP/内存实现
//! └── utils/         # 错误、日志、金额、校验
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod email;
pub mod tracking;
pub mod utils;

// Re-export 公共类型
pub use auth::{CurrentUser, JwtService, OtpStore};
pub use core::{Config, Server, ServerState, build_router};
pub use db::DbService;
pub use tracking::{GeoPoint, RiderFeed};
pub use utils::{AppError, AppResponse, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   _____ __
  / ___// /_____  ________
  \__ \/ __/ __ \/ ___/ _ \
 ___/ / /_/ /_/ / /  /  __/
/____/\__/\____/_/   \___/
   _____
  / ___/___  ______   _____  _____
  \__ \/ _ \/ ___/ | / / _ \/ ___/
 ___/ /  __/ /   | |/ /  __/ /
/____/\___/_/    |___/\___/_/
    "#
    );
}
