use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::{
    AppState,
    auth::Identity,
    cookie,
    credentials::{
        hash_password, validate_registration, verify_password, verify_unknown_account,
    },
    error::ApiError,
    extract::{ValidJson, ValidPath},
    models::{
        AuthResponse, CreateLocationRequest, CreateSpotRequest, HealthResponse, Location,
        LoginRequest, NewUser, RegisterRequest, Role, Spot, SpotCard, UserResponse,
    },
    repository::RepoError,
    visibility::{VisibilityFilter, parse_category},
};

// --- Auth Handlers ---

/// register
///
/// [Guest Route] Creates a `user` account. Policy failures are 400, a taken
/// email is 409.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing field or password policy violation"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() || payload.confirm_password.is_empty() {
        return Err(ApiError::Validation("Missing required fields".into()));
    }
    if !looks_like_email(email) {
        return Err(ApiError::Validation("Invalid email format".into()));
    }

    validate_registration(&payload.password, &payload.confirm_password)?;

    match state.repo.find_user_by_email(email).await {
        Ok(_) => return Err(ApiError::Conflict("User already exists".into())),
        Err(RepoError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = hash_password(&payload.password, state.config.bcrypt_cost).await?;

    let user = state
        .repo
        .insert_user(NewUser {
            email: email.to_string(),
            password_hash,
            role: Role::User,
        })
        .await
        .map_err(|e| match e {
            // Lost a race with a concurrent registration of the same email.
            RepoError::UniqueViolation => ApiError::Conflict("User already exists".into()),
            other => other.into(),
        })?;

    tracing::info!(user_id = user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "Registration successful".into(),
            user: Some(UserResponse::from(&user)),
        }),
    ))
}

/// login
///
/// [Guest Route] Verifies credentials and starts a session. Any token the client
/// still presents is rotated out, so a planted cookie never becomes authenticated.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in, session cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidJson(payload): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = payload.email.trim();
    if email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation("Missing required fields".into()));
    }

    // Unknown email and wrong password are indistinguishable to the caller.
    let user = match state.repo.find_user_by_email(email).await {
        Ok(user) => user,
        Err(RepoError::NotFound) => {
            verify_unknown_account(&payload.password, state.config.bcrypt_cost).await?;
            return Err(ApiError::InvalidCredentials);
        }
        Err(e) => return Err(e.into()),
    };
    if !verify_password(&payload.password, &user.password_hash).await? {
        tracing::info!(user_id = user.id, "login failed: bad password");
        return Err(ApiError::InvalidCredentials);
    }

    let previous = cookie::session_token(&headers, &state.config.session_cookie_name);
    let token = state
        .sessions
        .rotate(previous.as_ref(), user.id, user.role, &user.email)
        .await?;
    let set_cookie = cookie::issue(&state.config, &token)?;

    tracing::info!(user_id = user.id, role = %user.role, "user logged in");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, set_cookie)],
        Json(AuthResponse {
            message: "Login successful".into(),
            user: Some(UserResponse::from(&user)),
        }),
    ))
}

/// logout
///
/// [Authenticated Route] Destroys the session and clears the cookie.
#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out", body = AuthResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn logout(
    identity: Identity,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(token) = cookie::session_token(&headers, &state.config.session_cookie_name) {
        state.sessions.destroy(&token).await;
    }
    let set_cookie = cookie::clear(&state.config)?;

    tracing::info!(user_id = identity.user_id(), "user logged out");

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, set_cookie)],
        Json(AuthResponse {
            message: "Logout successful".into(),
            user: None,
        }),
    ))
}

/// get_me
///
/// [Authenticated Route] The current account, read fresh from the repository.
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn get_me(
    identity: Identity,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .repo
        .find_user_by_id(identity.user_id())
        .await
        .map_err(|e| match e {
            RepoError::NotFound => ApiError::NotFound("User not found".into()),
            other => other.into(),
        })?;
    Ok(Json(UserResponse::from(&user)))
}

// --- Spot Handlers ---

/// list_public_spots
///
/// [Public Route] Every public-tier spot. The secret tier is filtered out here
/// regardless of whether the caller is logged in.
#[utoipa::path(
    get,
    path = "/spots",
    responses((status = 200, description = "Public spots", body = [SpotCard]))
)]
pub async fn list_public_spots(
    State(filter): State<VisibilityFilter>,
) -> Result<Json<Vec<SpotCard>>, ApiError> {
    Ok(Json(filter.list_public(None).await?))
}

/// list_public_spots_by_category
///
/// [Public Route] Public spots in one category. 403 for the secret tier.
#[utoipa::path(
    get,
    path = "/spots/public/category/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses(
        (status = 200, description = "Spots", body = [SpotCard]),
        (status = 400, description = "Unknown category"),
        (status = 403, description = "Secret category")
    )
)]
pub async fn list_public_spots_by_category(
    State(filter): State<VisibilityFilter>,
    ValidPath(category): ValidPath<String>,
) -> Result<Json<Vec<SpotCard>>, ApiError> {
    let category = parse_category(&category)?;
    Ok(Json(filter.list_public(Some(category)).await?))
}

/// get_spot
///
/// [Public Route] One spot by id. Secret-tier spots are 404 here.
#[utoipa::path(
    get,
    path = "/spots/{id}",
    params(("id" = i64, Path, description = "Spot ID")),
    responses(
        (status = 200, description = "Found", body = SpotCard),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_spot(
    State(filter): State<VisibilityFilter>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<SpotCard>, ApiError> {
    Ok(Json(filter.get_public(id).await?))
}

/// list_all_spots
///
/// [Authenticated Route] Every spot, secret tier included.
#[utoipa::path(
    get,
    path = "/spots/all",
    responses(
        (status = 200, description = "All spots", body = [SpotCard]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_all_spots(
    _identity: Identity,
    State(filter): State<VisibilityFilter>,
) -> Result<Json<Vec<SpotCard>>, ApiError> {
    Ok(Json(filter.list_authenticated(None).await?))
}

/// list_spots_by_category
///
/// [Authenticated Route] Spots in any category, including the secret tier. Being
/// logged in is the only entitlement checked.
#[utoipa::path(
    get,
    path = "/spots/category/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses(
        (status = 200, description = "Spots", body = [SpotCard]),
        (status = 400, description = "Unknown category"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_spots_by_category(
    _identity: Identity,
    State(filter): State<VisibilityFilter>,
    ValidPath(category): ValidPath<String>,
) -> Result<Json<Vec<SpotCard>>, ApiError> {
    let category = parse_category(&category)?;
    Ok(Json(filter.list_authenticated(Some(category)).await?))
}

/// create_spot
///
/// [Admin Route] Adds a spot to the catalog.
#[utoipa::path(
    post,
    path = "/admin/spots",
    request_body = CreateSpotRequest,
    responses(
        (status = 201, description = "Created", body = Spot),
        (status = 400, description = "Invalid spot"),
        (status = 401, description = "Not logged in"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_spot(
    identity: Identity,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateSpotRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let spot = state.repo.insert_spot(payload).await?;
    tracing::info!(spot_id = spot.id, category = %spot.category, admin = identity.user_id(), "spot created");
    Ok((StatusCode::CREATED, Json(spot)))
}

// --- Location Handlers ---

#[utoipa::path(
    get,
    path = "/locations",
    responses((status = 200, description = "All locations", body = [Location]))
)]
pub async fn list_locations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Location>>, ApiError> {
    Ok(Json(state.repo.list_locations().await?))
}

#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(("id" = i64, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Found", body = Location),
        (status = 404, description = "Not found")
    )
)]
pub async fn get_location(
    State(state): State<AppState>,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<Location>, ApiError> {
    let location = state.repo.find_location(id).await.map_err(|e| match e {
        RepoError::NotFound => ApiError::NotFound("Location not found".into()),
        other => other.into(),
    })?;
    Ok(Json(location))
}

/// create_location
///
/// [Admin Route] Adds a location. Coordinates are range-checked first.
#[utoipa::path(
    post,
    path = "/admin/locations",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Created", body = Location),
        (status = 400, description = "Invalid coordinates or address"),
        (status = 403, description = "Not an admin")
    )
)]
pub async fn create_location(
    _identity: Identity,
    State(state): State<AppState>,
    ValidJson(payload): ValidJson<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate()?;
    let location = state.repo.insert_location(payload).await?;
    Ok((StatusCode::CREATED, Json(location)))
}

// --- Health ---

#[utoipa::path(
    get,
    path = "/public/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
    })
}

// Shape check only; deliverability is not our concern.
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(' ')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::looks_like_email;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.com"));
        assert!(!looks_like_email("ab.com"));
        assert!(!looks_like_email("@b.com"));
        assert!(!looks_like_email("a@"));
        assert!(!looks_like_email("a@b@c"));
        assert!(!looks_like_email("a b@c.com"));
    }
}
