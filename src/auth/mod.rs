//! Authentication session lifecycle.
//!
//! This module provides:
//! - `Session` / `UserProfile`: the persisted record of who is logged in
//! - `SessionStore`: durable persistence of the session fields
//! - `SessionManager`: the state machine that owns every auth transition
//! - `SessionProvider`: the process-wide handle that wires transitions to
//!   navigation
//!
//! Sessions are persisted under three fixed storage keys and restored once
//! at startup.

pub mod error;
pub mod provider;
pub mod session;
pub mod state;
pub mod store;

pub use error::{AuthenticationError, SessionError};
pub use provider::{Router, SessionProvider, DASHBOARD_ROUTE, LOGIN_ROUTE};
pub use session::{Credentials, Session, UserProfile};
pub use state::{AuthState, Authenticator, LoginOutcome, LogoutOutcome, SessionManager};
pub use store::SessionStore;
