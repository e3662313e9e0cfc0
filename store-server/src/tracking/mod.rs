//! 骑手位置追踪模块
//!
//! 进程内唯一一份“最新骑手坐标”，三个出口共用：
//!
//! ```text
//! 骑手端 update-location ─→ RiderFeed（最新值覆盖）
//!                              ├─ Socket.IO 广播 "location"（含发送方）
//!                              ├─ GET /api/rider/location（REST 轮询）
//!                              └─ track-order 落盘到订单记录
//! ```
//!
//! 无历史、无按订单隔离：单骑手模型下所有订阅者看同一个坐标。

pub mod feed;
pub mod socket;

pub use feed::{DEFAULT_POSITION, GeoPoint, RiderFeed};
pub use socket::build_layer;
