#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, header},
};
use parking_lot::Mutex;
use spot_gate::{
    AppConfig, AppState, create_router,
    models::{
        CreateLocationRequest, CreateSpotRequest, Location, NewUser, Spot, SpotCard, User,
    },
    repository::{RepoError, RepoResult, Repository, RepositoryState},
    session::{InMemorySessionStore, SessionState},
    visibility::Category,
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use tower::ServiceExt;

// --- In-Memory Repository ---

/// Backs the `Repository` trait with plain vectors so tests can run without Postgres.
#[derive(Default)]
pub struct InMemoryRepo {
    users: Mutex<Vec<User>>,
    locations: Mutex<Vec<Location>>,
    spots: Mutex<Vec<Spot>>,
    // When set, every call fails with an opaque database error.
    pub broken: AtomicBool,
    // When set, `list_spot_cards` ignores its category argument.
    pub ignore_category_filter: AtomicBool,
}

impl InMemoryRepo {
    pub fn seeded() -> Self {
        let repo = Self::default();
        repo.add_location("Pilies kalnas", 54.6867, 25.2907);
        repo.add_spot(1, Category::Nature, "Hill view");
        repo.add_spot(1, Category::OutdoorGym, "Bar park");
        repo.add_spot(1, Category::SecretPlaces, "Hidden courtyard");
        repo
    }

    pub fn add_location(&self, address: &str, latitude: f64, longitude: f64) -> i64 {
        let mut locations = self.locations.lock();
        let id = locations.len() as i64 + 1;
        locations.push(Location {
            id,
            address: address.into(),
            latitude,
            longitude,
        });
        id
    }

    pub fn add_spot(&self, location_id: i64, category: Category, name: &str) -> i64 {
        let mut spots = self.spots.lock();
        let id = spots.len() as i64 + 1;
        spots.push(Spot {
            id,
            category,
            name: name.into(),
            description: format!("{} description", name),
            image_url: String::new(),
            location_id,
        });
        id
    }

    pub fn add_user(&self, email: &str, password_hash: &str, role: spot_gate::models::Role) -> i64 {
        let mut users = self.users.lock();
        let id = users.len() as i64 + 1;
        users.push(User {
            id,
            email: email.into(),
            password_hash: password_hash.into(),
            role,
        });
        id
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }

    fn check(&self) -> RepoResult<()> {
        if self.broken.load(Ordering::SeqCst) {
            Err(RepoError::Database("connection reset".into()))
        } else {
            Ok(())
        }
    }

    fn card(&self, spot: &Spot) -> SpotCard {
        let locations = self.locations.lock();
        let location = locations
            .iter()
            .find(|l| l.id == spot.location_id)
            .cloned()
            .unwrap_or(Location {
                id: 0,
                address: String::new(),
                latitude: 0.0,
                longitude: 0.0,
            });
        SpotCard {
            id: spot.id,
            name: spot.name.clone(),
            category: spot.category,
            address: location.address,
            image_url: spot.image_url.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
        }
    }
}

#[async_trait]
impl Repository for InMemoryRepo {
    async fn find_user_by_email(&self, email: &str) -> RepoResult<User> {
        self.check()?;
        self.users
            .lock()
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn find_user_by_id(&self, id: i64) -> RepoResult<User> {
        self.check()?;
        self.users
            .lock()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn insert_user(&self, user: NewUser) -> RepoResult<User> {
        self.check()?;
        let mut users = self.users.lock();
        if users.iter().any(|u| u.email == user.email) {
            return Err(RepoError::UniqueViolation);
        }
        let created = User {
            id: users.len() as i64 + 1,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_spot_card(&self, id: i64) -> RepoResult<SpotCard> {
        self.check()?;
        let spot = self
            .spots
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        Ok(self.card(&spot))
    }

    async fn list_spot_cards(&self, categories: &[Category]) -> RepoResult<Vec<SpotCard>> {
        self.check()?;
        let ignore = self.ignore_category_filter.load(Ordering::SeqCst);
        let spots: Vec<Spot> = self
            .spots
            .lock()
            .iter()
            .filter(|s| ignore || categories.contains(&s.category))
            .cloned()
            .collect();
        Ok(spots.iter().map(|s| self.card(s)).collect())
    }

    async fn insert_spot(&self, req: CreateSpotRequest) -> RepoResult<Spot> {
        self.check()?;
        if !self.locations.lock().iter().any(|l| l.id == req.location_id) {
            return Err(RepoError::InvalidReference);
        }
        let id = self.add_spot(req.location_id, req.category, &req.name);
        let spot = self
            .spots
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)?;
        Ok(spot)
    }

    async fn find_location(&self, id: i64) -> RepoResult<Location> {
        self.check()?;
        self.locations
            .lock()
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or(RepoError::NotFound)
    }

    async fn list_locations(&self) -> RepoResult<Vec<Location>> {
        self.check()?;
        Ok(self.locations.lock().clone())
    }

    async fn insert_location(&self, req: CreateLocationRequest) -> RepoResult<Location> {
        self.check()?;
        let id = self.add_location(&req.address, req.latitude, req.longitude);
        self.find_location(id).await
    }
}

// --- App Harness ---

pub struct TestApp {
    pub router: Router,
    pub repo: Arc<InMemoryRepo>,
    pub sessions: Arc<InMemorySessionStore>,
    pub config: AppConfig,
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(InMemoryRepo::seeded())
}

pub fn spawn_app_with(repo: InMemoryRepo) -> TestApp {
    let repo = Arc::new(repo);
    let config = AppConfig::default();
    let sessions = Arc::new(InMemorySessionStore::new(config.session_lifetime));

    let state = AppState {
        repo: repo.clone() as RepositoryState,
        sessions: sessions.clone() as SessionState,
        config: config.clone(),
    };

    TestApp {
        router: create_router(state),
        repo,
        sessions,
        config,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        body: serde_json::Value,
        cookie: Option<&str>,
    ) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Posts `body` verbatim as `application/json`, for bodies `serde_json` cannot build.
    pub async fn post_raw(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Registers and logs in, returning the `name=value` cookie pair.
    pub async fn login_as(&self, email: &str, password: &str) -> String {
        let register = self
            .post_json(
                "/register",
                serde_json::json!({
                    "email": email,
                    "password": password,
                    "confirmPassword": password,
                }),
                None,
            )
            .await;
        assert_eq!(register.status(), 201);

        let login = self
            .post_json(
                "/login",
                serde_json::json!({ "email": email, "password": password }),
                None,
            )
            .await;
        assert_eq!(login.status(), 200);
        session_cookie(&login).expect("login sets a session cookie")
    }
}

/// Extracts `name=value` from the response's `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(|pair| pair.trim().to_string())
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("body is json")
}
