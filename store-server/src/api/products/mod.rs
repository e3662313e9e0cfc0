//! Product API 模块
//!
//! 商品目录与内嵌评论。读操作公开（店面首页在登录前展示），
//! 写操作仅限管理员，评论提交需要登录。

mod handler;

use axum::{
    Router,
    routing::get,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/products", product_routes())
}

fn product_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route(
            "/{id}",
            get(handler::get_by_id)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route(
            "/{id}/reviews",
            get(handler::list_reviews).post(handler::add_review),
        )
}
