//! Typed API client over the authenticated session.
//!
//! Every call goes through [`SessionManager::fetch`], so token attachment,
//! CSRF headers, and 401/403 recovery all apply transparently. UI layers use
//! the generic JSON helpers for their CRUD traffic; the profile calls here
//! are the ones the session shell itself needs.

use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{CachedUser, SessionManager};
use crate::error::AuthError;

const ME_PATH: &str = "/users/me";

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    data: ProfileData,
}

#[derive(Debug, Deserialize)]
struct ProfileData {
    user: CachedUser,
}

/// Clone is cheap - the underlying session manager is a shared handle.
#[derive(Clone)]
pub struct ApiClient {
    session: SessionManager,
}

impl ApiClient {
    pub fn new(session: SessionManager) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Fetch the current profile from the server.
    pub async fn me(&self) -> Result<CachedUser, AuthError> {
        let response = self.session.fetch(Method::GET, ME_PATH).await?;
        let response = Self::check_response(response).await?;
        let profile: ProfileResponse = response.json().await.map_err(|err| {
            AuthError::InvalidResponse(format!("Failed to parse profile response: {}", err))
        })?;
        Ok(profile.data.user)
    }

    /// Background session validation: confirms the server still accepts the
    /// session. Transport failures count as "unknown", not "invalid", so
    /// only an auth rejection reports `false`.
    pub async fn validate(&self) -> bool {
        match self.session.fetch(Method::GET, ME_PATH).await {
            Ok(response) if response.status() == StatusCode::UNAUTHORIZED => false,
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "Session validation inconclusive");
                true
            }
        }
    }

    // ===== Generic JSON helpers =====

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, AuthError> {
        let response = self.session.fetch(Method::GET, path).await?;
        Self::parse(response, path).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let response = self.session.fetch_json(Method::POST, path, body).await?;
        Self::parse(response, path).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        let response = self.session.fetch_json(Method::PATCH, path, body).await?;
        Self::parse(response, path).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), AuthError> {
        let response = self.session.fetch(Method::DELETE, path).await?;
        Self::check_response(response).await?;
        Ok(())
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, AuthError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(AuthError::from_status(status, &body))
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> Result<T, AuthError> {
        let response = Self::check_response(response).await?;
        response.json().await.map_err(|err| {
            AuthError::InvalidResponse(format!("Failed to parse response from {}: {}", path, err))
        })
    }
}
