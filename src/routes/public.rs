use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints outside the profile-backed auth middleware. Everything that returns
/// course data lives behind `authenticated_routes`.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers; always "ok".
        .route("/health", get(|| async { "ok" }))
        // POST /api/me/profile
        // First sign-in: needs a valid token but no existing profile.
        .route("/api/me/profile", post(handlers::create_profile))
}
