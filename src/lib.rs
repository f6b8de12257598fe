//! Attendly - client core for a geofenced attendance portal.
//!
//! This crate carries the authentication session lifecycle for the portal's
//! client applications: acquiring a session through a credential exchange,
//! persisting it across restarts, restoring it at startup, and tearing it
//! down on logout. It also provides the HTTP client used to talk to the
//! portal API and the durable storage the session is persisted through.
//!
//! The entry point for applications is [`auth::SessionProvider`]: construct
//! one at application start, call [`auth::SessionProvider::restore`], and
//! hand it to every surface that needs authentication state.

pub mod api;
pub mod auth;
pub mod config;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{
    AuthState, AuthenticationError, Authenticator, Credentials, Router, Session, SessionError,
    SessionManager, SessionProvider, SessionStore, UserProfile,
};
pub use config::Config;
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError};
