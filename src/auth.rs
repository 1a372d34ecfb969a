use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use crate::{AppState, cookie, error::ApiError, models::Role, session::SessionData};

/// Identity
///
/// The caller's identity for the duration of one request. Only the gate can build
/// one (from a live session) and it lives in the request extensions, so it dies
/// with the request. It is not a credential: nothing accepts an `Identity` in
/// place of a session lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    user_id: i64,
    role: Role,
    email: String,
}

impl Identity {
    fn from_session(session: &SessionData) -> Self {
        Self {
            user_id: session.user_id,
            role: session.role,
            email: session.email.clone(),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Guard
///
/// The admission rule a route group declares. A group uses exactly one guard, the
/// strongest it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Only callers without a session (login, register).
    GuestOnly,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users with the admin role.
    Admin,
}

/// Why a guard turned the caller away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    AlreadyAuthenticated,
    Unauthenticated,
    InsufficientRole,
}

/// The outcome of a passed guard.
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Anonymous,
    Identified(Identity),
}

impl Guard {
    /// decide
    ///
    /// Pure admission decision over the caller's live session (already filtered
    /// for expiry by the store). Reads nothing else and mutates nothing.
    pub fn decide(self, session: Option<&SessionData>) -> Result<Admission, Rejection> {
        let session = session.filter(|s| !s.is_anonymous());
        match (self, session) {
            (Guard::GuestOnly, None) => Ok(Admission::Anonymous),
            (Guard::GuestOnly, Some(_)) => Err(Rejection::AlreadyAuthenticated),

            (Guard::Authenticated | Guard::Admin, None) => Err(Rejection::Unauthenticated),
            (Guard::Authenticated, Some(s)) => Ok(Admission::Identified(Identity::from_session(s))),
            (Guard::Admin, Some(s)) => match s.role {
                Role::Admin => Ok(Admission::Identified(Identity::from_session(s))),
                Role::User => Err(Rejection::InsufficientRole),
            },
        }
    }
}

// --- Middleware ---

/// enforce
///
/// Resolves the session cookie, runs `guard.decide` and, on admission, stores the
/// `Identity` in the request extensions before handing over to the route.
/// A missing, malformed, unknown or expired cookie all count as "no session".
async fn enforce(
    guard: Guard,
    state: AppState,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let session = match cookie::session_token(request.headers(), &state.config.session_cookie_name) {
        Some(token) => state.sessions.load(&token).await,
        None => None,
    };

    match guard.decide(session.as_ref()) {
        Ok(Admission::Anonymous) => {}
        Ok(Admission::Identified(identity)) => {
            request.extensions_mut().insert(identity);
        }
        Err(rejection) => {
            tracing::debug!(?guard, ?rejection, uri = %request.uri(), "request rejected by guard");
            return Err(rejection.into());
        }
    }

    Ok(next.run(request).await)
}

/// Route layer for `Guard::GuestOnly`.
pub async fn require_guest(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(Guard::GuestOnly, state, request, next).await
}

/// Route layer for `Guard::Authenticated`.
pub async fn require_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(Guard::Authenticated, state, request, next).await
}

/// Route layer for `Guard::Admin`.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    enforce(Guard::Admin, state, request, next).await
}

/// Identity Extractor
///
/// Lets handlers take `Identity` as an argument. It only reads what the gate
/// attached; on a route without an identifying guard it rejects with 401.
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .ok_or(ApiError::Unauthenticated)
    }
}
