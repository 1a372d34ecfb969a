use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Admin Router Module
///
/// Catalog maintenance, nested under `/admin` and wrapped in `Guard::Admin`.
/// A caller without a session gets 401; a signed-in non-admin gets 403.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /admin/spots
        .route("/spots", post(handlers::create_spot))
        // POST /admin/locations
        // Address must be non-empty and coordinates within range.
        .route("/locations", post(handlers::create_location))
}
