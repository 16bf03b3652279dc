//! Authentication and session lifecycle.
//!
//! This module provides:
//! - `SessionManager`: access-token lifecycle with silent refresh, CSRF
//!   double-submit handling, single-flight 401 recovery, and idle logout
//! - `AccessToken` / `decode_expiry`: JWT expiry bookkeeping
//! - `CsrfProvider`: pluggable CSRF token transport
//! - `UserStore` / `CachedUser`: durable UI-convenience user snapshot
//! - `CredentialStore`: optional remember-me via the OS keychain

pub mod credentials;
pub mod csrf;
mod idle;
pub mod manager;
pub mod store;
pub mod token;
pub mod user;

pub use credentials::CredentialStore;
pub use csrf::{CookieCsrfProvider, CsrfProvider};
pub use manager::{LoginOutcome, SessionExpiredHook, SessionManager, SessionManagerBuilder};
pub use store::UserStore;
pub use token::{decode_expiry, AccessToken, MemoryTokenCache, TokenCache};
pub use user::CachedUser;
