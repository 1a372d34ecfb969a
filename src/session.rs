use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use std::{collections::HashMap, fmt, sync::Arc};
use uuid::Uuid;

use crate::models::Role;

/// Default lifetime of a session: one day from login.
pub const DEFAULT_SESSION_LIFETIME_HOURS: i64 = 24;

// Two v4 UUIDs rendered as simple hex.
const TOKEN_LEN: usize = 64;

// --- Token ---

/// SessionToken
///
/// The opaque identifier carried in the session cookie. Generated from the OS RNG
/// (two random v4 UUIDs, 244 random bits) and only ever compared for equality.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Mints a fresh, unguessable token.
    pub fn generate() -> Self {
        Self(format!(
            "{}{}",
            Uuid::new_v4().simple(),
            Uuid::new_v4().simple()
        ))
    }

    /// Accepts a token received from a client. Anything that could not have been
    /// produced by `generate` is refused before it reaches a store lookup.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == TOKEN_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer secrets; keep them out of logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({}…)", &self.0[..8.min(self.0.len())])
    }
}

// --- Session Data ---

/// SessionData
///
/// The attribute set stored behind a token. It is always written and read as a
/// whole, so a reader never observes a half-updated session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionData {
    pub user_id: i64,
    pub role: Role,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionData {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// A session without a user id carries no identity.
    pub fn is_anonymous(&self) -> bool {
        self.user_id == 0
    }
}

/// Keys addressable through `SessionStore::get`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    UserId,
    Role,
    Email,
}

/// A single attribute value returned by `SessionStore::get`.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAttribute {
    UserId(i64),
    Role(Role),
    Email(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session backend failure: {0}")]
    Backend(String),
}

// --- Store Contract ---

/// SessionStore
///
/// The contract for session persistence. Handlers and the auth gate only see
/// `SessionState` (an `Arc<dyn SessionStore>`), so the in-memory map can be
/// swapped for an external cache without touching either.
///
/// Lookups never fail observably: a backend that cannot answer must report the
/// session as absent, which callers treat as "not logged in".
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Starts a new session for the user and returns its token.
    async fn create(&self, user_id: i64, role: Role, email: &str)
    -> Result<SessionToken, SessionError>;

    /// Replaces `previous` (if any) with a fresh session. The old token is dead
    /// by the time the new one is returned.
    async fn rotate(
        &self,
        previous: Option<&SessionToken>,
        user_id: i64,
        role: Role,
        email: &str,
    ) -> Result<SessionToken, SessionError>;

    /// Returns the live attribute set for `token`, or `None` if the session is
    /// unknown, destroyed, expired or anonymous.
    async fn load(&self, token: &SessionToken) -> Option<SessionData>;

    /// Removes the session. Unknown tokens are ignored.
    async fn destroy(&self, token: &SessionToken);

    /// Evicts every expired session and returns how many were removed.
    async fn purge_expired(&self) -> usize;

    /// Single attribute lookup over `load`.
    async fn get(&self, token: &SessionToken, key: SessionKey) -> Option<SessionAttribute> {
        let data = self.load(token).await?;
        Some(match key {
            SessionKey::UserId => SessionAttribute::UserId(data.user_id),
            SessionKey::Role => SessionAttribute::Role(data.role),
            SessionKey::Email => SessionAttribute::Email(data.email),
        })
    }
}

/// SessionState
///
/// The shared handle placed in `AppState`.
pub type SessionState = Arc<dyn SessionStore>;

// --- In-Memory Backing ---

/// InMemorySessionStore
///
/// Process-local session map guarded by a `parking_lot::RwLock`. Every operation is
/// a single short critical section and the lock is never held across an await, so
/// concurrent requests only contend for the duration of a hash map access.
///
/// Expired entries are removed lazily on lookup, and in bulk by `purge_expired`.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionToken, SessionData>>,
    lifetime: TimeDelta,
}

impl InMemorySessionStore {
    pub fn new(lifetime: TimeDelta) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> TimeDelta {
        self.lifetime
    }

    /// Number of stored sessions, expired ones included until they are evicted.
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    fn new_session(&self, user_id: i64, role: Role, email: &str) -> SessionData {
        let now = Utc::now();
        SessionData {
            user_id,
            role,
            email: email.to_string(),
            created_at: now,
            expires_at: now + self.lifetime,
        }
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new(TimeDelta::hours(DEFAULT_SESSION_LIFETIME_HOURS))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(
        &self,
        user_id: i64,
        role: Role,
        email: &str,
    ) -> Result<SessionToken, SessionError> {
        self.rotate(None, user_id, role, email).await
    }

    async fn rotate(
        &self,
        previous: Option<&SessionToken>,
        user_id: i64,
        role: Role,
        email: &str,
    ) -> Result<SessionToken, SessionError> {
        let data = self.new_session(user_id, role, email);
        let token = SessionToken::generate();

        let mut sessions = self.sessions.write();
        if let Some(old) = previous {
            sessions.remove(old);
        }
        sessions.insert(token.clone(), data);
        Ok(token)
    }

    async fn load(&self, token: &SessionToken) -> Option<SessionData> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read();
            match sessions.get(token) {
                None => return None,
                Some(data) if !data.is_expired_at(now) => {
                    return (!data.is_anonymous()).then(|| data.clone());
                }
                Some(_) => {}
            }
        }

        // Expired: evict, re-checking under the write lock in case a rotation won the race.
        let mut sessions = self.sessions.write();
        if sessions.get(token).is_some_and(|d| d.is_expired_at(now)) {
            sessions.remove(token);
        }
        None
    }

    async fn destroy(&self, token: &SessionToken) {
        self.sessions.write().remove(token);
    }

    async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, data| !data.is_expired_at(now));
        before - sessions.len()
    }
}
