use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod guard;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod server;
pub mod storage;

pub mod routes;
use auth::AuthUser;
use routes::{authenticated, pages, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};
pub use server::ServeStaticError;
pub use storage::{MemStorage, StorageState};

/// ApiDoc
///
/// OpenAPI document served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_me, handlers::create_profile, handlers::complete_onboarding,
        handlers::list_courses, handlers::get_course, handlers::create_course, handlers::update_course,
        handlers::delete_course
    ),
    components(
        schemas(
            models::User, models::Role, models::StudentProfile, models::Course,
            models::CreateCourseRequest, models::UpdateCourseRequest,
            models::CreateProfileRequest, models::OnboardingResponse,
        )
    ),
    tags(
        (name = "course-portal", description = "Course management API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cheaply clonable container of the services every request may need.
#[derive(Clone)]
pub struct AppState {
    pub repo: RepositoryState,
    pub storage: StorageState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects with 401 before the handler runs if `AuthUser` cannot be extracted.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles API routes, the client bundle (or the dev-server hook), the page guard,
/// and the observability layers.
///
/// In `Env::Local` a missing build directory is tolerated and the client is assumed
/// to be served by its own dev server. Otherwise a missing build directory is an error.
pub fn create_router(state: AppState) -> Result<Router, ServeStaticError> {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let api = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        );

    let static_dir = &state.config.static_dir;
    let app = if state.config.env == config::Env::Local && !static_dir.is_dir() {
        server::log(
            &format!("{} not built; expecting the client dev server", static_dir.display()),
            server::DEFAULT_LOG_SOURCE,
        );
        server::setup_dev_server(api)
    } else {
        server::serve_static(api, static_dir)?
    };

    let app = app
        .layer(middleware::from_fn_with_state(state.clone(), pages::page_guard))
        .with_state(state);

    Ok(app
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors))
}

/// trace_span_logger
///
/// Request span carrying method, URI, and the generated `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
