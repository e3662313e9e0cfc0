//! 认证授权模块
//!
//! 提供 JWT 认证、OTP 二步验证和中间件：
//! - [`JwtService`] - JWT 令牌服务
//! - [`CurrentUser`] - 当前用户上下文
//! - [`OtpStore`] - 一次性验证码存储
//! - [`require_auth`] - 认证中间件
//! - [`require_admin`] - 管理员检查中间件

pub mod extractor;
pub mod jwt;
pub mod middleware;
pub mod otp;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
pub use middleware::{require_admin, require_auth};
pub use otp::{OTP_TTL_MINUTES, OtpError, OtpStore};
