//! Persisted sign-in session so a returning user skips the login flow.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{storage::KeyValueStorage, time::Clock, Result};

pub const SESSION_KEY: &str = "user_session";
pub const DEFAULT_SESSION_DAYS: i64 = 30;

/// The authenticated user, as handed over by the sign-in provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SessionUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user: SessionUser,
    pub saved_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

pub struct SessionStore {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl SessionStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_lifetime(storage, clock, Duration::days(DEFAULT_SESSION_DAYS))
    }

    pub fn with_lifetime(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        lifetime: Duration,
    ) -> Self {
        Self {
            storage,
            clock,
            lifetime,
        }
    }

    /// Stores `user` with a fresh expiry.
    pub async fn save(&self, user: SessionUser) -> Result<Session> {
        let now = self.clock.now();
        let session = Session {
            user,
            saved_at: now,
            expires_at: now + self.lifetime,
        };
        let data = serde_json::to_string(&session)?;
        self.storage.write(SESSION_KEY, &data).await?;
        Ok(session)
    }

    /// Returns the stored user while the session is valid. Expired or
    /// unreadable sessions are cleared and reported as absent.
    pub async fn restore(&self) -> Result<Option<SessionUser>> {
        let Some(data) = self.storage.read(SESSION_KEY).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<Session>(&data) {
            Ok(session) if !session.is_expired(self.clock.now()) => Ok(Some(session.user)),
            _ => {
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Extends a still-valid session. Returns `None` when there is nothing to extend.
    pub async fn refresh(&self) -> Result<Option<Session>> {
        match self.restore().await? {
            Some(user) => Ok(Some(self.save(user).await?)),
            None => Ok(None),
        }
    }

    pub async fn clear(&self) -> Result<()> {
        self.storage.remove(SESSION_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{storage::MemoryStorage, time::FixedClock};
    use chrono::TimeZone;

    fn setup() -> (Arc<MemoryStorage>, Arc<FixedClock>, SessionStore) {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        ));
        let store = SessionStore::new(storage.clone(), clock.clone());
        (storage, clock, store)
    }

    #[tokio::test]
    async fn restores_a_saved_session() {
        let (_, clock, store) = setup();
        let mut user = SessionUser::new("google-42");
        user.email = Some("someone@example.com".into());
        let session = store.save(user.clone()).await.unwrap();
        assert_eq!(session.expires_at - session.saved_at, Duration::days(30));

        clock.advance(Duration::days(29));
        assert_eq!(store.restore().await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn expired_sessions_are_cleared() {
        let (storage, clock, store) = setup();
        store.save(SessionUser::new("u")).await.unwrap();
        clock.advance(Duration::days(31));
        assert_eq!(store.restore().await.unwrap(), None);
        assert!(storage.peek(SESSION_KEY).await.is_none());
    }

    #[tokio::test]
    async fn refresh_extends_only_valid_sessions() {
        let (_, clock, store) = setup();
        assert!(store.refresh().await.unwrap().is_none());

        store.save(SessionUser::new("u")).await.unwrap();
        clock.advance(Duration::days(20));
        let refreshed = store.refresh().await.unwrap().expect("session extended");
        assert_eq!(refreshed.expires_at, clock.now() + Duration::days(30));
    }

    #[tokio::test]
    async fn unreadable_session_is_treated_as_absent() {
        let storage = Arc::new(MemoryStorage::with_entries([(SESSION_KEY, "garbage")]));
        let clock = Arc::new(FixedClock::new(Utc::now()));
        let store = SessionStore::new(storage.clone(), clock);
        assert_eq!(store.restore().await.unwrap(), None);
        assert!(storage.peek(SESSION_KEY).await.is_none());
    }
}
