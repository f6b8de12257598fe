//! Process-wide session handle.
//!
//! One `SessionProvider` is constructed at application start and handed to
//! every surface that needs authentication state - there is no ambient
//! global. It owns the session state machine for the life of the process
//! and turns login/logout transitions into navigation redirects.

use std::sync::Arc;

use tracing::debug;

use super::error::SessionError;
use super::session::{Credentials, UserProfile};
use super::state::{AuthState, SessionManager};

/// Route shown after a successful login.
pub const DASHBOARD_ROUTE: &str = "/dashboard";

/// Route shown after logout.
pub const LOGIN_ROUTE: &str = "/login";

/// Fire-and-forget navigation collaborator.
pub trait Router: Send + Sync {
    fn redirect_to(&self, route: &str);
}

pub struct SessionProvider {
    manager: Arc<SessionManager>,
    router: Arc<dyn Router>,
}

impl SessionProvider {
    pub fn new(manager: Arc<SessionManager>, router: Arc<dyn Router>) -> Self {
        Self { manager, router }
    }

    /// Current authentication state.
    pub fn state(&self) -> AuthState {
        self.manager.state()
    }

    /// Whether the startup restoration has resolved.
    pub fn restoration_complete(&self) -> bool {
        self.manager.restoration_complete()
    }

    /// Restore the persisted session at startup.
    ///
    /// Never redirects: rendering for the restored state is the concern of
    /// route guards, not of this handle.
    pub async fn restore(&self) -> AuthState {
        self.manager.restore().await
    }

    /// Log in and, on entry into the authenticated state, navigate to the
    /// dashboard. A re-login that merely overwrites an existing session does
    /// not navigate.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, SessionError> {
        let outcome = self.manager.login(credentials).await?;
        if outcome.reentrant {
            debug!("re-login, skipping redirect");
        } else {
            self.router.redirect_to(DASHBOARD_ROUTE);
        }
        Ok(outcome.user)
    }

    /// Log out and navigate to the login screen.
    ///
    /// Redirects once when an authenticated session ended, whether or not
    /// the storage wipe succeeded: the in-memory state has already been
    /// forced to anonymous. An idempotent logout while already anonymous
    /// never navigates, even when the wipe fails.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let outcome = self.manager.logout().await;
        if outcome.was_authenticated {
            self.router.redirect_to(LOGIN_ROUTE);
        }
        match outcome.wipe_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Persist an updated profile for the current session.
    ///
    /// Used after the portal's `/me/` endpoint reports fresh data, e.g.
    /// following a profile edit. Never navigates.
    pub async fn update_profile(&self, user: UserProfile) -> Result<(), SessionError> {
        self.manager.update_profile(user).await
    }
}
