use thiserror::Error;

use crate::storage::StorageError;

/// Credential exchange rejected by the portal or failed in transit.
#[derive(Error, Debug)]
pub enum AuthenticationError {
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("server error: {0}")]
    Server(String),

    #[error("unexpected response from server: {0}")]
    InvalidResponse(String),
}

/// Failure of a session-mutating operation.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
