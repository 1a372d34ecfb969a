use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints open to anonymous and logged-in callers alike. Spot listings here
/// never include the secret tier: the `VisibilityFilter` refuses it on this path
/// no matter what session the caller holds.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /public/health
        // Liveness check for load balancers.
        .route("/public/health", get(handlers::health))
        // GET /spots
        // All public-tier spots.
        .route("/spots", get(handlers::list_public_spots))
        // GET /spots/public/category/{category}
        // One public category; 403 for the secret tier, 400 for unknown names.
        .route(
            "/spots/public/category/{category}",
            get(handlers::list_public_spots_by_category),
        )
        // GET /spots/{id}
        .route("/spots/{id}", get(handlers::get_spot))
        .route("/locations", get(handlers::list_locations))
        .route("/locations/{id}", get(handlers::get_location))
}
