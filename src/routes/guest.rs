use crate::{AppState, handlers};
use axum::{Router, routing::post};

/// Guest Router Module
///
/// Endpoints that only make sense without a session. A logged-in caller gets 403
/// "Already authenticated" from the guard before reaching these handlers.
pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        // Rotates any stale session token the client still carries.
        .route("/login", post(handlers::login))
}
