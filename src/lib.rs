//! campus-session - session and authentication client for the campus
//! school-management REST API.
//!
//! The crate owns exactly one valid access token per process, renews it
//! silently before expiry (or reactively on a 401), attaches bearer and
//! CSRF credentials to every request, and tears the session down on refresh
//! failure or idle timeout. UI shells embed a [`SessionManager`] at
//! bootstrap and route their API traffic through it or through the typed
//! [`ApiClient`] wrapper.
//!
//! ```no_run
//! use campus_session::{ApiClient, LoginOutcome, SessionConfig, SessionManager};
//!
//! # async fn example() -> Result<(), campus_session::AuthError> {
//! let session = SessionManager::new(SessionConfig::new("https://api.campus.example"))?;
//! session.on_session_expired(|| {
//!     // navigate back to the login screen
//! });
//!
//! match session.login("jordan", "hunter2").await? {
//!     LoginOutcome::Authenticated(user) => {
//!         let api = ApiClient::new(session.clone());
//!         let profile = api.me().await?;
//!         assert_eq!(profile.username, user.username);
//!     }
//!     LoginOutcome::PasswordChangeRequired => {
//!         session.complete_first_login("a-better-password").await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod error;

pub use api::ApiClient;
pub use auth::{
    decode_expiry, AccessToken, CachedUser, CookieCsrfProvider, CredentialStore, CsrfProvider,
    LoginOutcome, MemoryTokenCache, SessionExpiredHook, SessionManager, SessionManagerBuilder,
    TokenCache, UserStore,
};
pub use config::{Config, SessionConfig};
pub use error::AuthError;
