//! Order API 模块
//!
//! 下单、配送流转与订单跟踪。下单与跟踪面向已登录客户，
//! 列表与配送操作面向骑手/管理员，删除仅限管理员。

mod handler;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// 配送凭证上传的请求体上限（字段本身限 5 MB，留出 multipart 开销）
const PROOF_BODY_LIMIT: usize = 6 * 1024 * 1024;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", order_routes())
}

fn order_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::place))
        .route("/track-order/{id}", get(handler::track))
        .route("/{id}", get(handler::get_by_id).delete(handler::delete))
        .route("/{id}/deliver", patch(handler::start_delivery))
        .route(
            "/{id}/deliver-proof",
            post(handler::submit_proof).layer(DefaultBodyLimit::max(PROOF_BODY_LIMIT)),
        )
}
