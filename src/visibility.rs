use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    models::SpotCard,
    repository::{RepoError, RepositoryState},
};

// --- Categories ---

/// Category
///
/// The closed set of spot classifications. The wire and database spellings are the
/// catalog's own (`Gamta`, `Lauko_treniruokliai`, `Slaptos_vietos`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[sqlx(type_name = "spot_category")]
#[ts(export)]
pub enum Category {
    /// Parks, forests, viewpoints.
    #[serde(rename = "Gamta")]
    #[sqlx(rename = "Gamta")]
    Nature,
    /// Outdoor training equipment.
    #[serde(rename = "Lauko_treniruokliai")]
    #[sqlx(rename = "Lauko_treniruokliai")]
    OutdoorGym,
    /// Members-only places. The only secret-tier category.
    #[serde(rename = "Slaptos_vietos")]
    #[sqlx(rename = "Slaptos_vietos")]
    SecretPlaces,
}

/// Tier
///
/// Who may see a category: anyone, or only signed-in users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Public,
    Secret,
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Nature,
        Category::OutdoorGym,
        Category::SecretPlaces,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Nature => "Gamta",
            Category::OutdoorGym => "Lauko_treniruokliai",
            Category::SecretPlaces => "Slaptos_vietos",
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            Category::Nature | Category::OutdoorGym => Tier::Public,
            Category::SecretPlaces => Tier::Secret,
        }
    }

    pub fn is_public(&self) -> bool {
        self.tier() == Tier::Public
    }

    /// Every category anonymous callers may list.
    pub fn public_tier() -> Vec<Category> {
        Self::ALL.into_iter().filter(Category::is_public).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid category: {0}")]
pub struct InvalidCategory(pub String);

impl FromStr for Category {
    type Err = InvalidCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_category(s)
    }
}

/// parse_category
///
/// Maps a caller-supplied token onto `Category`. Exact match only: there is no
/// case folding and no fallback value.
pub fn parse_category(token: &str) -> Result<Category, InvalidCategory> {
    Category::ALL
        .into_iter()
        .find(|c| c.as_str() == token)
        .ok_or_else(|| InvalidCategory(token.to_string()))
}

// --- Filter ---

/// VisibilityFilter
///
/// Decides which spots each access path may return.
///
/// The public methods refuse the secret tier on their own, independently of any
/// route guard. `list_authenticated` does no session check at all: it must only
/// be mounted behind the `Authenticated` guard.
#[derive(Clone)]
pub struct VisibilityFilter {
    repo: RepositoryState,
}

impl VisibilityFilter {
    pub fn new(repo: RepositoryState) -> Self {
        Self { repo }
    }

    /// list_public
    ///
    /// Public-tier spots, optionally narrowed to one category. Asking for a
    /// secret-tier category is `Forbidden` whatever the caller's session state.
    pub async fn list_public(&self, category: Option<Category>) -> Result<Vec<SpotCard>, ApiError> {
        let categories = match category {
            Some(c) if !c.is_public() => {
                tracing::debug!(category = %c, "secret category requested on public path");
                return Err(ApiError::Forbidden(
                    "Secret category is not accessible through the public endpoint".into(),
                ));
            }
            Some(c) => vec![c],
            None => Category::public_tier(),
        };

        let mut spots = self.repo.list_spot_cards(&categories).await?;
        // The query is already restricted; this guards against a backend that ignores it.
        spots.retain(|s| s.category.is_public());
        Ok(spots)
    }

    /// list_authenticated
    ///
    /// Every spot, or every spot in `category`, secret tier included.
    pub async fn list_authenticated(
        &self,
        category: Option<Category>,
    ) -> Result<Vec<SpotCard>, ApiError> {
        let categories = match category {
            Some(c) => vec![c],
            None => Category::ALL.to_vec(),
        };
        Ok(self.repo.list_spot_cards(&categories).await?)
    }

    /// get_public
    ///
    /// A single spot on the public path. Secret-tier spots are reported as missing
    /// so the public path never confirms that a given id exists.
    pub async fn get_public(&self, id: i64) -> Result<SpotCard, ApiError> {
        match self.repo.find_spot_card(id).await {
            Ok(card) if card.category.is_public() => Ok(card),
            Ok(_) | Err(RepoError::NotFound) => Err(ApiError::NotFound("Spot not found".into())),
            Err(e) => Err(e.into()),
        }
    }
}
