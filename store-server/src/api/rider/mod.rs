//! Rider API Module

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

/// Rider router
///
/// REST mirror of the Socket.IO feed so the tracking page can poll
/// without holding a socket open.
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/rider/location", get(handler::location))
}
