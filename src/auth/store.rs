use std::sync::Arc;

use tracing::debug;

use crate::storage::{StorageBackend, StorageError};

use super::session::{Session, UserProfile};

/// Storage key for the bearer access token.
const ACCESS_TOKEN_KEY: &str = "access_token";

/// Storage key for the refresh token.
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Storage key for the serialized user profile.
const USER_DATA_KEY: &str = "user_data";

/// Durable persistence of the session triple under fixed keys.
///
/// The backend only guarantees per-key atomicity, so a crash mid-save can
/// leave a partial triple behind; `load` treats that as no session.
pub struct SessionStore {
    backend: Arc<dyn StorageBackend>,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Persist all three session fields.
    pub async fn save(&self, session: &Session) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(&session.user)?;
        self.backend
            .set(ACCESS_TOKEN_KEY, &session.access_token)
            .await?;
        self.backend
            .set(REFRESH_TOKEN_KEY, &session.refresh_token)
            .await?;
        self.backend.set(USER_DATA_KEY, &user_json).await?;
        Ok(())
    }

    /// Load the persisted session, if a complete one exists.
    ///
    /// A missing or partial triple is not an error and reads back as `None`.
    /// Only backend I/O failures and an unparseable profile surface as
    /// errors.
    pub async fn load(&self) -> Result<Option<Session>, StorageError> {
        let access_token = self.backend.get(ACCESS_TOKEN_KEY).await?;
        let refresh_token = self.backend.get(REFRESH_TOKEN_KEY).await?;
        let user_json = self.backend.get(USER_DATA_KEY).await?;

        match (access_token, refresh_token, user_json) {
            (Some(access_token), Some(refresh_token), Some(user_json)) => {
                let user: UserProfile = serde_json::from_str(&user_json)?;
                Ok(Some(Session {
                    access_token,
                    refresh_token,
                    user,
                }))
            }
            (None, None, None) => Ok(None),
            _ => {
                // An interrupted save left a partial triple behind.
                debug!("partial session triple in storage, treating as no session");
                Ok(None)
            }
        }
    }

    /// Remove all three session fields. Clearing an empty store succeeds.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.backend.remove(ACCESS_TOKEN_KEY).await?;
        self.backend.remove(REFRESH_TOKEN_KEY).await?;
        self.backend.remove(USER_DATA_KEY).await?;
        Ok(())
    }

    /// Overwrite only the stored profile, leaving the tokens untouched.
    ///
    /// Restricted to the auth module: callers must already hold a complete
    /// session, otherwise this would create a partial triple.
    pub(super) async fn save_user(&self, user: &UserProfile) -> Result<(), StorageError> {
        let user_json = serde_json::to_string(user)?;
        self.backend.set(USER_DATA_KEY, &user_json).await
    }
}
