//! User Administration API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::require_admin;
use crate::core::ServerState;

/// User router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/users", routes())
}

fn routes() -> Router<ServerState> {
    // 共享路由：本人或管理员（归属检查在 handler 内）
    let shared_routes = Router::new().route(
        "/{id}",
        get(handler::get_by_id).put(handler::update),
    );

    // 管理路由：仅管理员可用
    let manage_routes = Router::new()
        .route(
            "/",
            get(handler::list).post(handler::create),
        )
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_admin));

    shared_routes.merge(manage_routes)
}
