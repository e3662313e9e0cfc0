//! Authentication Routes

mod handler;

use axum::{Router, routing::get, routing::post};

use crate::core::ServerState;

/// Build authentication router
/// - /api/auth/register, /verify-email, /login, /verify-otp: public
///   (listed in the auth middleware's public-route table)
/// - /api/auth/me: protected (global require_auth middleware)
pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/api/auth/register", post(handler::register))
        .route("/api/auth/verify-email", get(handler::verify_email))
        .route("/api/auth/login", post(handler::login))
        .route("/api/auth/verify-otp", post(handler::verify_otp))
        .route("/api/auth/me", get(handler::me))
}
