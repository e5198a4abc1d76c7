//! Session cookie store — the single owner of the two portal cookies.
//!
//! The backend contract keeps the bearer token in a script-readable
//! `auth_token` cookie and the user id in an `httpOnly` `user_id` cookie,
//! both expiring after 7 days. Nothing outside this module reads or writes
//! them; the API client and the session manager go through `SharedCookieJar`.

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config;

#[derive(Error, Debug)]
pub enum CookieError {
    #[error("Cookie store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cookie store serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Cookie store write failed: {0}")]
    Persist(String),

    #[error("Cookie store lock poisoned")]
    LockPoisoned,
}

/// One stored cookie. `http_only` mirrors the browser attribute: the
/// `user_id` cookie is never exposed to page scripts, only to the
/// server-rendered gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cookie {
    pub value: String,
    pub expires_at: DateTime<Utc>,
    pub http_only: bool,
}

impl Cookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCookies {
    auth_token: Option<Cookie>,
    user_id: Option<Cookie>,
}

/// Cookie jar persisted under the app data directory. A `None` path keeps
/// the jar memory-only (tests, embedded shells that manage cookies
/// themselves).
#[derive(Debug)]
pub struct CookieJar {
    cookies: StoredCookies,
    path: Option<PathBuf>,
}

impl CookieJar {
    pub fn in_memory() -> Self {
        Self {
            cookies: StoredCookies::default(),
            path: None,
        }
    }

    /// Load the jar from disk, dropping any cookie that has already
    /// expired. A missing file is an empty jar.
    pub fn load(path: PathBuf) -> Result<Self, CookieError> {
        let mut cookies = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            StoredCookies::default()
        };

        let now = Utc::now();
        if cookies.auth_token.as_ref().is_some_and(|c| c.is_expired(now)) {
            cookies.auth_token = None;
        }
        if cookies.user_id.as_ref().is_some_and(|c| c.is_expired(now)) {
            cookies.user_id = None;
        }

        Ok(Self {
            cookies,
            path: Some(path),
        })
    }

    /// Load from the default location under ~/Healova/.
    pub fn open_default() -> Result<Self, CookieError> {
        Self::load(config::cookie_store_path())
    }

    pub fn auth_token(&self) -> Option<String> {
        self.cookies
            .auth_token
            .as_ref()
            .filter(|c| !c.is_expired(Utc::now()))
            .map(|c| c.value.clone())
    }

    pub fn user_id(&self) -> Option<String> {
        self.cookies
            .user_id
            .as_ref()
            .filter(|c| !c.is_expired(Utc::now()))
            .map(|c| c.value.clone())
    }

    pub fn set_auth_token(&mut self, token: &str) -> Result<(), CookieError> {
        self.cookies.auth_token = Some(Self::fresh_cookie(token, false));
        self.persist()
    }

    pub fn set_user_id(&mut self, user_id: &str) -> Result<(), CookieError> {
        self.cookies.user_id = Some(Self::fresh_cookie(user_id, true));
        self.persist()
    }

    pub fn clear_auth_token(&mut self) -> Result<(), CookieError> {
        self.cookies.auth_token = None;
        self.persist()
    }

    pub fn clear_all(&mut self) -> Result<(), CookieError> {
        self.cookies.auth_token = None;
        self.cookies.user_id = None;
        self.persist()
    }

    fn fresh_cookie(value: &str, http_only: bool) -> Cookie {
        Cookie {
            value: value.to_string(),
            expires_at: Utc::now() + Duration::seconds(config::COOKIE_MAX_AGE_SECS),
            http_only,
        }
    }

    /// Write the jar atomically: serialize to a temp file in the same
    /// directory, then rename over the target.
    fn persist(&self) -> Result<(), CookieError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let parent = path
            .parent()
            .ok_or_else(|| CookieError::Persist("cookie store path has no parent".into()))?;
        std::fs::create_dir_all(parent)?;

        let json = serde_json::to_string_pretty(&self.cookies)?;
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(json.as_bytes())?;
        tmp.persist(path)
            .map_err(|e| CookieError::Persist(e.to_string()))?;
        Ok(())
    }
}

/// Cheaply cloneable handle shared by the API client (token) and the
/// session manager (user id, sign-out).
#[derive(Clone)]
pub struct SharedCookieJar {
    inner: Arc<RwLock<CookieJar>>,
}

impl SharedCookieJar {
    pub fn new(jar: CookieJar) -> Self {
        Self {
            inner: Arc::new(RwLock::new(jar)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(CookieJar::in_memory())
    }

    pub fn open_default() -> Result<Self, CookieError> {
        Ok(Self::new(CookieJar::open_default()?))
    }

    pub fn token(&self) -> Result<Option<String>, CookieError> {
        let jar = self.inner.read().map_err(|_| CookieError::LockPoisoned)?;
        Ok(jar.auth_token())
    }

    pub fn user_id(&self) -> Result<Option<String>, CookieError> {
        let jar = self.inner.read().map_err(|_| CookieError::LockPoisoned)?;
        Ok(jar.user_id())
    }

    pub fn set_token(&self, token: &str) -> Result<(), CookieError> {
        let mut jar = self.inner.write().map_err(|_| CookieError::LockPoisoned)?;
        jar.set_auth_token(token)
    }

    pub fn set_user_id(&self, user_id: &str) -> Result<(), CookieError> {
        let mut jar = self.inner.write().map_err(|_| CookieError::LockPoisoned)?;
        jar.set_user_id(user_id)
    }

    pub fn clear_token(&self) -> Result<(), CookieError> {
        let mut jar = self.inner.write().map_err(|_| CookieError::LockPoisoned)?;
        jar.clear_auth_token()
    }

    pub fn clear(&self) -> Result<(), CookieError> {
        let mut jar = self.inner.write().map_err(|_| CookieError::LockPoisoned)?;
        jar.clear_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_jar_has_no_cookies() {
        let jar = CookieJar::in_memory();
        assert_eq!(jar.auth_token(), None);
        assert_eq!(jar.user_id(), None);
    }

    #[test]
    fn set_and_read_both_cookies() {
        let mut jar = CookieJar::in_memory();
        jar.set_auth_token("tok-123").unwrap();
        jar.set_user_id("patient-1").unwrap();
        assert_eq!(jar.auth_token(), Some("tok-123".into()));
        assert_eq!(jar.user_id(), Some("patient-1".into()));
    }

    #[test]
    fn auth_token_is_script_readable_user_id_is_not() {
        let mut jar = CookieJar::in_memory();
        jar.set_auth_token("tok").unwrap();
        jar.set_user_id("patient-1").unwrap();
        assert!(!jar.cookies.auth_token.as_ref().unwrap().http_only);
        assert!(jar.cookies.user_id.as_ref().unwrap().http_only);
    }

    #[test]
    fn cookies_expire_after_ttl() {
        let mut jar = CookieJar::in_memory();
        jar.set_auth_token("tok").unwrap();
        // Rewind the expiry to the past.
        jar.cookies.auth_token.as_mut().unwrap().expires_at = Utc::now() - Duration::seconds(1);
        assert_eq!(jar.auth_token(), None);
    }

    #[test]
    fn fresh_cookie_expiry_is_seven_days_out() {
        let cookie = CookieJar::fresh_cookie("tok", false);
        let ttl = cookie.expires_at - Utc::now();
        assert!(ttl > Duration::seconds(config::COOKIE_MAX_AGE_SECS - 60));
        assert!(ttl <= Duration::seconds(config::COOKIE_MAX_AGE_SECS));
    }

    #[test]
    fn clear_all_removes_both() {
        let mut jar = CookieJar::in_memory();
        jar.set_auth_token("tok").unwrap();
        jar.set_user_id("patient-1").unwrap();
        jar.clear_all().unwrap();
        assert_eq!(jar.auth_token(), None);
        assert_eq!(jar.user_id(), None);
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_cookies.json");

        let mut jar = CookieJar::load(path.clone()).unwrap();
        jar.set_auth_token("tok-456").unwrap();
        jar.set_user_id("doctor-1").unwrap();
        drop(jar);

        let reloaded = CookieJar::load(path).unwrap();
        assert_eq!(reloaded.auth_token(), Some("tok-456".into()));
        assert_eq!(reloaded.user_id(), Some("doctor-1".into()));
    }

    #[test]
    fn expired_cookies_dropped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session_cookies.json");

        let mut jar = CookieJar::load(path.clone()).unwrap();
        jar.set_auth_token("stale").unwrap();
        jar.cookies.auth_token.as_mut().unwrap().expires_at = Utc::now() - Duration::days(1);
        jar.persist().unwrap();
        drop(jar);

        let reloaded = CookieJar::load(path).unwrap();
        assert_eq!(reloaded.auth_token(), None);
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let jar = CookieJar::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(jar.auth_token(), None);
    }

    #[test]
    fn shared_jar_clones_see_writes() {
        let shared = SharedCookieJar::in_memory();
        let other = shared.clone();
        shared.set_token("tok-789").unwrap();
        assert_eq!(other.token().unwrap(), Some("tok-789".into()));
        other.clear_token().unwrap();
        assert_eq!(shared.token().unwrap(), None);
    }
}
