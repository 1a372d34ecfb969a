use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Endpoints behind `Guard::Authenticated`. Handlers receive the caller's
/// `Identity` from the gate.
///
/// This is the only place the secret tier is reachable: `VisibilityFilter::list_authenticated`
/// performs no session check of its own and relies on this router's guard.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        // GET /me
        .route("/me", get(handlers::get_me))
        // GET /logout
        // Destroys the session and clears the cookie.
        .route("/logout", get(handlers::logout))
        // GET /spots/all
        // Every spot, secret tier included.
        .route("/spots/all", get(handlers::list_all_spots))
        // GET /spots/category/{category}
        // Any category, secret tier included.
        .route(
            "/spots/category/{category}",
            get(handlers::list_spots_by_category),
        )
}
