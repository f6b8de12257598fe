//! The session state machine.
//!
//! `SessionManager` is the only component that transitions `AuthState`. All
//! session-mutating operations (`restore`, `login`, `logout`,
//! `update_profile`) are serialized through one mutex so their storage
//! writes never interleave: a logout issued while a login is suspended on
//! the network runs only after that login resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::{AuthenticationError, SessionError};
use super::session::{Credentials, Session, UserProfile};
use super::store::SessionStore;
use crate::storage::StorageError;

/// Exchanges credentials for a portal-issued session.
///
/// Only consulted on login; logout is local and never reaches the backend.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn exchange(&self, credentials: &Credentials) -> Result<Session, AuthenticationError>;
}

/// Current authentication state, derived from the session.
///
/// Never persisted: it is recomputed from storage at restore and updated
/// synchronously on every login/logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Restoration has not completed yet.
    Unknown,
    /// A valid session exists for this user.
    Authenticated(UserProfile),
    /// No valid session exists.
    Anonymous,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserProfile,
    /// True when the user was already authenticated and the session was
    /// simply overwritten (re-login).
    pub reentrant: bool,
}

/// Result of a logout.
///
/// Always produced: the local transition cannot fail, only the storage wipe
/// can, and that failure rides along rather than masking whether a session
/// actually ended.
#[derive(Debug)]
pub struct LogoutOutcome {
    /// True when the call ended an authenticated session, as opposed to an
    /// idempotent logout while already anonymous.
    pub was_authenticated: bool,
    /// Set when wiping the persisted session failed.
    pub wipe_error: Option<StorageError>,
}

pub struct SessionManager {
    store: SessionStore,
    authenticator: Arc<dyn Authenticator>,
    /// Serializes all session-mutating operations (single-flight).
    op_lock: Mutex<()>,
    /// Held only for non-suspending reads and writes.
    state: RwLock<AuthState>,
    restored: AtomicBool,
}

impl SessionManager {
    pub fn new(store: SessionStore, authenticator: Arc<dyn Authenticator>) -> Self {
        Self {
            store,
            authenticator,
            op_lock: Mutex::new(()),
            state: RwLock::new(AuthState::Unknown),
            restored: AtomicBool::new(false),
        }
    }

    /// Current state. `Unknown` until `restore` has completed.
    pub fn state(&self) -> AuthState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether startup restoration has completed.
    pub fn restoration_complete(&self) -> bool {
        self.restored.load(Ordering::Acquire)
    }

    /// Replace the state, returning the prior value.
    fn set_state(&self, next: AuthState) -> AuthState {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *state, next)
    }

    /// Rebuild the state from persisted session data.
    ///
    /// Reads storage at most once per process lifetime; later calls return
    /// the already-resolved state without touching storage. Storage failures
    /// are downgraded to `Anonymous` rather than surfaced.
    pub async fn restore(&self) -> AuthState {
        let _op = self.op_lock.lock().await;
        if self.restored.load(Ordering::Acquire) {
            return self.state();
        }

        let next = match self.store.load().await {
            Ok(Some(session)) => {
                debug!(user_id = session.user.id, "restored persisted session");
                AuthState::Authenticated(session.user)
            }
            Ok(None) => {
                debug!("no persisted session");
                AuthState::Anonymous
            }
            Err(e) => {
                warn!(error = %e, "failed to read persisted session, treating as anonymous");
                AuthState::Anonymous
            }
        };

        self.set_state(next.clone());
        self.restored.store(true, Ordering::Release);
        next
    }

    /// Exchange credentials for a session, persist it, and become
    /// authenticated.
    ///
    /// On any failure the prior state is preserved: a rejected exchange
    /// surfaces as `SessionError::Authentication`, a failed persist as
    /// `SessionError::Storage`, and neither mutates `AuthState`.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginOutcome, SessionError> {
        let _op = self.op_lock.lock().await;

        let session = self.authenticator.exchange(credentials).await?;
        self.store.save(&session).await?;

        let user = session.user.clone();
        let prior = self.set_state(AuthState::Authenticated(session.user));
        info!(user_id = user.id, "login succeeded");

        Ok(LoginOutcome {
            user,
            reentrant: prior.is_authenticated(),
        })
    }

    /// End the session locally.
    ///
    /// No backend revocation is attempted. The in-memory state is forced to
    /// `Anonymous` even when wiping storage fails, so the user is never
    /// shown as logged in on the strength of credentials that could not be
    /// deleted; the storage failure is reported in the outcome.
    pub async fn logout(&self) -> LogoutOutcome {
        let _op = self.op_lock.lock().await;

        let wipe_error = self.store.clear().await.err();
        let prior = self.set_state(AuthState::Anonymous);
        let was_authenticated = prior.is_authenticated();
        if was_authenticated {
            info!("logged out");
        }
        if let Some(ref e) = wipe_error {
            warn!(error = %e, "failed to wipe persisted session");
        }

        LogoutOutcome {
            was_authenticated,
            wipe_error,
        }
    }

    /// Replace the stored profile for the current session.
    ///
    /// Used after the portal reports updated profile data. A no-op when not
    /// authenticated: writing the profile key alone would leave a partial
    /// triple behind.
    pub async fn update_profile(&self, user: UserProfile) -> Result<(), SessionError> {
        let _op = self.op_lock.lock().await;

        if !self.state().is_authenticated() {
            warn!("ignoring profile update while not authenticated");
            return Ok(());
        }

        self.store.save_user(&user).await?;
        self.set_state(AuthState::Authenticated(user));
        Ok(())
    }
}
