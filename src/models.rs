use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{error::ApiError, visibility::Category};

// --- Roles ---

/// Role
///
/// The closed set of account roles. Stored in the `user_role` Postgres enum and
/// carried inside every session. Anything outside this set is rejected at the
/// boundary (`FromStr`, sqlx decoding, serde) instead of being coerced.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid user role: {0}")]
pub struct InvalidRole(pub String);

impl FromStr for Role {
    type Err = InvalidRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(InvalidRole(other.to_string())),
        }
    }
}

// --- Persistent Records ---

/// User
///
/// The stored credential record from the `users` table. The hash never leaves the
/// server: responses use `UserResponse` instead.
#[derive(Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
    pub role: Role,
}

// Hand-written so the hash cannot end up in a log line through `{:?}`.
impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Input to `Repository::insert_user`. The password is already hashed.
#[derive(Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Spot
///
/// A catalog entry as stored in the `spots` table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Spot {
    pub id: i64,
    pub category: Category,
    pub name: String,
    pub description: String,
    pub image_url: String,
    pub location_id: i64,
}

/// SpotCard
///
/// The listing projection of a spot joined with its location. This is what every
/// listing endpoint returns.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct SpotCard {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub address: String,
    pub image_url: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Location
///
/// A geocoded address from the `locations` table. Spots reference one by id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, PartialEq)]
#[ts(export)]
pub struct Location {
    pub id: i64,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

// --- API Payloads ---

#[derive(Debug, Clone, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    // Older clients send snake_case.
    #[serde(rename = "confirmPassword", alias = "confirm_password")]
    pub confirm_password: String,
}

#[derive(Debug, Clone, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// UserResponse
///
/// Public view of an account, returned by `/register`, `/login` and `/me`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// AuthResponse
///
/// Envelope for the auth endpoints. `user` is omitted on logout.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserResponse>,
}

#[derive(Debug, Clone, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateSpotRequest {
    pub category: Category,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub location_id: i64,
}

#[derive(Debug, Clone, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CreateLocationRequest {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CreateSpotRequest {
    /// Field checks run before the insert. The category is already closed by serde.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.name.trim().is_empty() {
            return Err(ApiError::Validation("name cannot be empty".into()));
        }
        if self.description.trim().is_empty() {
            return Err(ApiError::Validation("description cannot be empty".into()));
        }
        if self.location_id <= 0 {
            return Err(ApiError::Validation(format!(
                "invalid location_id: {}",
                self.location_id
            )));
        }
        Ok(())
    }
}

impl CreateLocationRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.address.trim().is_empty() {
            return Err(ApiError::Validation("address cannot be empty".into()));
        }
        // NaN fails both range checks.
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ApiError::Validation(format!(
                "latitude must be between -90 and 90, got: {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ApiError::Validation(format!(
                "longitude must be between -180 and 180, got: {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}
