//! API client for communicating with the attendance portal REST API.
//!
//! This module provides the `ApiClient` struct for the login credential
//! exchange and authenticated profile requests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::Deserialize;
use tracing::debug;

use crate::auth::{AuthenticationError, Authenticator, Credentials, Session, UserProfile};

use super::ApiError;

/// HTTP request timeout in seconds.
/// 30s allows for slow API responses while failing fast enough for good UX.
const REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access: String,
    refresh: String,
    user: UserProfile,
}

/// Fields the portal uses for error bodies, in order of preference.
#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
    detail: Option<String>,
}

/// API client for the attendance portal.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client for the portal at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        let base_url = base_url.into().trim().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            token: None,
        })
    }

    /// Set the bearer token for authenticated requests
    pub fn set_token(&mut self, token: String) {
        self.token = Some(token);
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn auth_headers(&self) -> Result<header::HeaderMap, ApiError> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref token) = self.token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
            headers.insert(header::AUTHORIZATION, value);
        }
        Ok(headers)
    }

    /// Extract the portal's error message from a response body.
    fn parse_error(body: &str, fallback: &str) -> String {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => parsed
                .error
                .or(parsed.message)
                .or(parsed.detail)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
            Err(_) => fallback.to_string(),
        }
    }

    /// Check if response is successful, mapping a failure status and body
    /// through `to_error`.
    async fn check_response_with<F>(
        response: reqwest::Response,
        to_error: F,
    ) -> Result<reqwest::Response, ApiError>
    where
        F: FnOnce(reqwest::StatusCode, &str) -> ApiError,
    {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(to_error(status, &body))
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        Self::check_response_with(response, ApiError::from_status).await
    }

    /// Map a rejected login response to an error.
    ///
    /// The portal answers 400 with {"error": "Invalid Credentials"} when the
    /// exchange is refused.
    fn login_error(status: reqwest::StatusCode, body: &str) -> ApiError {
        debug!(status = %status, "login rejected");
        match status.as_u16() {
            400 | 401 => ApiError::InvalidCredentials(Self::parse_error(body, "Login failed")),
            _ => ApiError::from_status(status, body),
        }
    }

    /// Exchange login credentials for a token pair and user profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ApiError> {
        let url = self.endpoint("token/login/");

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let response = Self::check_response_with(response, Self::login_error).await?;
        let login: LoginResponse = response.json().await?;

        Ok(Session {
            access_token: login.access,
            refresh_token: login.refresh,
            user: login.user,
        })
    }

    /// Fetch the current user's profile from `/me/`.
    pub async fn fetch_current_user(&self) -> Result<UserProfile, ApiError> {
        let url = self.endpoint("me/");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn exchange(&self, credentials: &Credentials) -> Result<Session, AuthenticationError> {
        self.login(&credentials.email, &credentials.password)
            .await
            .map_err(Into::into)
    }
}
