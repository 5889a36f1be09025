//! Server-side sessions keyed by bearer token

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::amortization::{CalculationHistory, CalculationRecord};
use crate::error::TrackerError;
use crate::models::UserId;
use crate::Result;

/// The authenticated caller, passed explicitly to every protected handler.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: Uuid,
    pub user_id: UserId,
    pub user_name: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub history: CalculationHistory,
}

impl Session {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn with_ttl_hours(hours: i64) -> Self {
        Self::new(Duration::hours(hours))
    }

    pub async fn create(&self, user_id: UserId, user_name: &str, email: &str) -> Session {
        let session = Session {
            token: Uuid::new_v4(),
            user_id,
            user_name: user_name.to_string(),
            email: email.to_string(),
            expires_at: Utc::now() + self.ttl,
            history: CalculationHistory::new(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session.token, session.clone());
        debug!(user_id, "Session opened");
        session
    }

    /// Resolve a live session; expired ones are dropped on sight.
    pub async fn get(&self, token: Uuid) -> Result<Session> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(&token) {
                Some(session) if !session.is_expired_at(now) => return Ok(session.clone()),
                Some(_) => {}
                None => return Err(invalid_session()),
            }
        }

        self.sessions.write().await.remove(&token);
        Err(TrackerError::Unauthorized("Session expired".to_string()))
    }

    /// Returns whether a session was removed.
    pub async fn remove(&self, token: Uuid) -> bool {
        self.sessions.write().await.remove(&token).is_some()
    }

    /// Follow a profile change so the session reports the current user name and e-mail.
    pub async fn refresh_identity(&self, token: Uuid, user_name: &str, email: &str) -> Result<()> {
        self.with_session(token, |session| {
            session.user_name = user_name.to_string();
            session.email = email.to_string();
        })
        .await
    }

    /// Prepend an EMI computation to the session log and return the log.
    pub async fn record_calculation(&self, token: Uuid, record: CalculationRecord) -> Result<Vec<CalculationRecord>> {
        self.with_session(token, |session| {
            session.history.record(record);
            session.history.to_vec()
        })
        .await
    }

    pub async fn calculation_history(&self, token: Uuid) -> Result<Vec<CalculationRecord>> {
        Ok(self.get(token).await?.history.to_vec())
    }

    /// Delete one log entry by position (0 = most recent) and return the remaining log.
    pub async fn remove_calculation(&self, token: Uuid, index: usize) -> Result<Vec<CalculationRecord>> {
        self.with_session(token, |session| {
            session
                .history
                .remove(index)
                .map(|_| session.history.to_vec())
                .ok_or_else(|| TrackerError::not_found(format!("History entry {}", index)))
        })
        .await?
    }

    /// Drop every expired session; returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired_at(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn with_session<T>(&self, token: Uuid, f: impl FnOnce(&mut Session) -> T) -> Result<T> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(&token) {
            Some(session) if !session.is_expired_at(Utc::now()) => Ok(f(session)),
            _ => Err(invalid_session()),
        }
    }
}

fn invalid_session() -> TrackerError {
    TrackerError::Unauthorized("Invalid session token".to_string())
}

/// Pull the token out of an `Authorization: Bearer <token>` header value.
pub fn parse_bearer(value: &str) -> Result<Uuid> {
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| TrackerError::Unauthorized("Missing bearer token".to_string()))?;

    Uuid::parse_str(token).map_err(|_| invalid_session())
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    Arc<SessionStore>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = TrackerError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| TrackerError::Unauthorized("Missing bearer token".to_string()))?;

        let token = parse_bearer(header)?;
        let sessions = Arc::<SessionStore>::from_ref(state);
        sessions.get(token).await
    }
}
