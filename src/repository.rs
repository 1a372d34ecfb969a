use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::{
    models::{CreateLocationRequest, CreateSpotRequest, Location, NewUser, Spot, SpotCard, User},
    visibility::Category,
};

/// RepoError
///
/// What the persistence layer can report. Only `NotFound`, `UniqueViolation` and
/// `InvalidReference` carry meaning for callers; everything else is opaque.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error("foreign key references a missing record")]
    InvalidReference,
    #[error("database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepoError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::UniqueViolation,
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => {
                RepoError::InvalidReference
            }
            other => RepoError::Database(other.to_string()),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// The persistence contract the handlers and the visibility filter consume.
/// Shared as `Arc<dyn Repository>` so tests can substitute an in-memory backing.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_email(&self, email: &str) -> RepoResult<User>;
    async fn find_user_by_id(&self, id: i64) -> RepoResult<User>;
    // Fails with `UniqueViolation` if the email is taken.
    async fn insert_user(&self, user: NewUser) -> RepoResult<User>;

    // --- Spots ---
    async fn find_spot_card(&self, id: i64) -> RepoResult<SpotCard>;
    // Cards whose category is in `categories`, ordered by id. Visibility rules are
    // the caller's job; this returns exactly what it is asked for.
    async fn list_spot_cards(&self, categories: &[Category]) -> RepoResult<Vec<SpotCard>>;
    // Fails with `InvalidReference` if the location does not exist.
    async fn insert_spot(&self, req: CreateSpotRequest) -> RepoResult<Spot>;

    // --- Locations ---
    async fn find_location(&self, id: i64) -> RepoResult<Location>;
    async fn list_locations(&self) -> RepoResult<Vec<Location>>;
    async fn insert_location(&self, req: CreateLocationRequest) -> RepoResult<Location>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The production implementation, backed by a `PgPool`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SPOT_CARD_SELECT: &str = r#"
    SELECT s.id, s.name, s.category, l.address, s.image_url, l.latitude, l.longitude
    FROM spots s
    JOIN locations l ON l.id = s.location_id
"#;

#[async_trait]
impl Repository for PostgresRepository {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<User> {
        let user =
            sqlx::query_as::<_, User>("SELECT id, email, password, role FROM users WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> RepoResult<User> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password, role
            "#,
        )
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_spot_card(&self, id: i64) -> RepoResult<SpotCard> {
        let query = format!("{} WHERE s.id = $1", SPOT_CARD_SELECT);
        let card = sqlx::query_as::<_, SpotCard>(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(card)
    }

    async fn list_spot_cards(&self, categories: &[Category]) -> RepoResult<Vec<SpotCard>> {
        if categories.is_empty() {
            return Ok(vec![]);
        }
        // Bound as `spot_category[]` through the array type `sqlx::Type` derives for `Category`.
        let query = format!(
            "{} WHERE s.category = ANY($1) ORDER BY s.id",
            SPOT_CARD_SELECT
        );
        let cards = sqlx::query_as::<_, SpotCard>(&query)
            .bind(categories)
            .fetch_all(&self.pool)
            .await?;
        Ok(cards)
    }

    async fn insert_spot(&self, req: CreateSpotRequest) -> RepoResult<Spot> {
        let spot = sqlx::query_as::<_, Spot>(
            r#"
            INSERT INTO spots (category, name, description, image_url, location_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, category, name, description, image_url, location_id
            "#,
        )
        .bind(req.category)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.image_url)
        .bind(req.location_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(spot)
    }

    async fn find_location(&self, id: i64) -> RepoResult<Location> {
        let location = sqlx::query_as::<_, Location>(
            "SELECT id, address, latitude, longitude FROM locations WHERE id = $1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        let locations = sqlx::query_as::<_, Location>(
            "SELECT id, address, latitude, longitude FROM locations ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(locations)
    }

    async fn insert_location(&self, req: CreateLocationRequest) -> RepoResult<Location> {
        let location = sqlx::query_as::<_, Location>(
            r#"
            INSERT INTO locations (address, latitude, longitude)
            VALUES ($1, $2, $3)
            RETURNING id, address, latitude, longitude
            "#,
        )
        .bind(&req.address)
        .bind(req.latitude)
        .bind(req.longitude)
        .fetch_one(&self.pool)
        .await?;
        Ok(location)
    }
}
