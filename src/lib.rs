use axum::{
    Router,
    extract::FromRef,
    http::{HeaderName, Method, header},
    middleware,
};
use std::time::Duration;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core: credential policy, session store, auth gate, visibility filter.
pub mod auth;
pub mod credentials;
pub mod session;
pub mod visibility;

// Collaborators: persistence, HTTP surface, configuration.
pub mod config;
pub mod cookie;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// One router per guard (Public, Guest, Authenticated, Admin).
pub mod routes;
use routes::{admin, authenticated, guest, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{PostgresRepository, RepositoryState};
pub use session::{InMemorySessionStore, SessionState};
pub use visibility::VisibilityFilter;

/// ApiDoc
///
/// OpenAPI document for every handler and schema, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::logout, handlers::get_me,
        handlers::list_public_spots, handlers::list_public_spots_by_category,
        handlers::get_spot, handlers::list_all_spots, handlers::list_spots_by_category,
        handlers::create_spot, handlers::list_locations, handlers::get_location,
        handlers::create_location, handlers::health
    ),
    components(
        schemas(
            models::Role, visibility::Category, models::Spot, models::SpotCard,
            models::Location, models::RegisterRequest, models::LoginRequest,
            models::UserResponse, models::AuthResponse, models::CreateSpotRequest,
            models::CreateLocationRequest, models::HealthResponse,
        )
    ),
    tags(
        (name = "spot-gate", description = "Spot catalog with session-gated visibility")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything a request may need, cloned cheaply into each handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence collaborator.
    pub repo: RepositoryState,
    /// Session backing store, shared by the auth gate and the auth handlers.
    pub sessions: SessionState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for VisibilityFilter {
    fn from_ref(app_state: &AppState) -> VisibilityFilter {
        VisibilityFilter::new(app_state.repo.clone())
    }
}

/// create_router
///
/// Assembles the guard-segregated routers, applies each group's single guard
/// layer, then the observability and CORS layers.
pub fn create_router(state: AppState) -> Router {
    // Credentialed CORS: the browser frontend sends the session cookie, so origins
    // are mirrored rather than wildcarded.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(300));

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Public: no guard.
        .merge(public::public_routes())
        .merge(
            guest::guest_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_guest,
            )),
        )
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_auth,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth::require_admin,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(
                    x_request_id.clone(),
                    MakeRequestUuid,
                ))
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
        .layer(cors)
}

/// trace_span_logger
///
/// Request span carrying method, path and the `x-request-id` set above, so every
/// log line of one request can be correlated. The query string is left out.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
