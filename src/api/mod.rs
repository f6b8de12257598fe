//! REST API client for the attendance portal.
//!
//! This module provides the `ApiClient` for communicating with the portal
//! backend: the credential exchange at login and the `/me/` profile fetch.
//!
//! The API uses JWT bearer token authentication; the token pair is issued
//! by the login endpoint and managed by the auth module.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
