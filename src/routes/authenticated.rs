use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// JSON API for signed-in users. The router is wrapped in the auth middleware in
/// `create_router`; role checks (instructor/admin for course writes, student for
/// onboarding) happen inside the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        // The resolved identity, including the student profile.
        .route("/api/me", get(handlers::get_me))
        // POST /api/me/onboarding
        // Completes the first-run flow for students and sets the fallback cookie.
        .route("/api/me/onboarding", post(handlers::complete_onboarding))
        // GET/POST /api/courses
        .route(
            "/api/courses",
            get(handlers::list_courses).post(handlers::create_course),
        )
        // GET/PUT/DELETE /api/courses/{id}
        // Writes are owner-only for instructors; admins may edit any course.
        .route(
            "/api/courses/{id}",
            get(handlers::get_course)
                .put(handlers::update_course)
                .delete(handlers::delete_course),
        )
}
