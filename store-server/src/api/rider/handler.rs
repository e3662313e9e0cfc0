//! Rider API Handlers

use axum::Json;
use axum::extract::State;

use crate::core::ServerState;
use crate::tracking::GeoPoint;
use crate::utils::{AppResponse, ok};

/// GET /api/rider/location - latest reported rider position
pub async fn location(State(state): State<ServerState>) -> Json<AppResponse<GeoPoint>> {
    ok(state.feed.current())
}
