//! Session and identity: resolves the current user from the stored bearer
//! token, exposes the `{current_user, is_loading}` snapshot pages consume,
//! and gates role-restricted routes.
//!
//! The manager is constructed explicitly and handed to whatever needs it —
//! there is no ambient global. Resolution fails open: any network or parse
//! failure during the who-am-I call is treated as "signed out", never
//! surfaced as an error.

pub mod cookies;

pub use cookies::{Cookie, CookieError, CookieJar, SharedCookieJar};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use thiserror::Error;

use crate::api::{ApiError, PortalApi, SignUpDetails};
use crate::models::User;
use crate::routes::Route;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Cookie(#[from] CookieError),

    #[error("Session state lock poisoned")]
    LockPoisoned,
}

/// What a page sees of the session. While `is_loading` is true the
/// identity is still being resolved and gated pages must render neutral
/// without redirecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub current_user: Option<User>,
    pub is_loading: bool,
}

impl SessionSnapshot {
    fn initial() -> Self {
        Self {
            current_user: None,
            is_loading: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// SessionManager
// ═══════════════════════════════════════════════════════════

/// Owner of the session lifecycle: resolve on startup, sign-in/up/out, and
/// the `user_id` cookie the server-rendered gate reads.
pub struct SessionManager<P: PortalApi> {
    api: P,
    cookies: SharedCookieJar,
    snapshot: RwLock<SessionSnapshot>,
}

impl<P: PortalApi> SessionManager<P> {
    pub fn new(api: P, cookies: SharedCookieJar) -> Self {
        Self {
            api,
            cookies,
            snapshot: RwLock::new(SessionSnapshot::initial()),
        }
    }

    pub fn snapshot(&self) -> Result<SessionSnapshot, SessionError> {
        let guard = self
            .snapshot
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(guard.clone())
    }

    /// Resolve the current user with the stored token. Every failure path
    /// lands on "signed out"; the returned snapshot always has
    /// `is_loading == false`.
    pub async fn resolve(&self) -> Result<SessionSnapshot, SessionError> {
        let current_user = match self.api.get_current_user().await {
            Ok(user) => user,
            Err(e) => {
                tracing::warn!(error = %e, "session resolution failed, treating as signed out");
                None
            }
        };

        match &current_user {
            Some(user) => {
                tracing::info!(user_id = %user.id, role = user.role.as_str(), "session resolved")
            }
            None => tracing::debug!("session resolved to signed out"),
        }

        self.store(SessionSnapshot {
            current_user,
            is_loading: false,
        })
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, SessionError> {
        let auth = self.api.sign_in(email, password).await?;
        self.cookies.set_user_id(&auth.user.id)?;
        self.store(SessionSnapshot {
            current_user: Some(auth.user.clone()),
            is_loading: false,
        })?;
        Ok(auth.user)
    }

    pub async fn sign_up(&self, details: &SignUpDetails) -> Result<User, SessionError> {
        let auth = self.api.sign_up(details).await?;
        self.cookies.set_user_id(&auth.user.id)?;
        self.store(SessionSnapshot {
            current_user: Some(auth.user.clone()),
            is_loading: false,
        })?;
        Ok(auth.user)
    }

    /// Local-only: forgets the token, drops both cookies, resets the
    /// snapshot to signed out.
    pub fn sign_out(&self) -> Result<(), SessionError> {
        self.api.sign_out()?;
        self.cookies.clear()?;
        self.store(SessionSnapshot {
            current_user: None,
            is_loading: false,
        })?;
        Ok(())
    }

    pub fn api(&self) -> &P {
        &self.api
    }

    fn store(&self, snapshot: SessionSnapshot) -> Result<SessionSnapshot, SessionError> {
        let mut guard = self
            .snapshot
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        *guard = snapshot.clone();
        Ok(snapshot)
    }
}

// ═══════════════════════════════════════════════════════════
// RouteGuard
// ═══════════════════════════════════════════════════════════

/// Decision for a gated page given the current snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Identity still resolving; render neutral, do not redirect.
    Loading,
    /// Visitor may see the page.
    Render,
    /// Navigate away. Issued at most once per guard instance.
    Redirect(Route),
    /// A redirect was already issued; the page is on its way out.
    AlreadyRedirected,
}

/// Per-page gate. `check` is re-run on every snapshot change because
/// resolution races the first render; the latch guarantees a single
/// redirect no matter how many times the snapshot settles.
pub struct RouteGuard {
    route: Route,
    redirected: AtomicBool,
}

impl RouteGuard {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            redirected: AtomicBool::new(false),
        }
    }

    pub fn check(&self, snapshot: &SessionSnapshot) -> GuardDecision {
        if !self.route.requires_auth() {
            return GuardDecision::Render;
        }
        if snapshot.is_loading {
            return GuardDecision::Loading;
        }

        let target = match &snapshot.current_user {
            None => Some(Route::SignIn),
            Some(user) => match self.route.required_role() {
                Some(required) if user.role != required => {
                    Some(Route::dashboard_for(user.role))
                }
                _ => None,
            },
        };

        match target {
            None => GuardDecision::Render,
            Some(route) => {
                if self.redirected.swap(true, Ordering::SeqCst) {
                    GuardDecision::AlreadyRedirected
                } else {
                    tracing::debug!(from = %self.route.path(), to = %route.path(), "gate redirect");
                    GuardDecision::Redirect(route)
                }
            }
        }
    }
}
