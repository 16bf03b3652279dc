//! Access token bookkeeping and JWT expiry inspection.
//!
//! The access token is a server-issued JWT held in memory only. The client
//! reads the `exp` claim to schedule silent refresh; it never verifies the
//! signature - the server re-validates every request, so the trust boundary
//! stays server-side.

use std::sync::Mutex;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;

/// In-memory access token with issue/expiry bookkeeping.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub issued_at: DateTime<Utc>,
    /// Derived from the JWT `exp` claim; `None` when the token is opaque.
    pub expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(value: String) -> Self {
        let expires_at = decode_expiry(&value);
        Self {
            value,
            issued_at: Utc::now(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expiry) => Utc::now() >= expiry,
            None => false,
        }
    }
}

#[derive(Deserialize)]
struct ExpiryClaim {
    exp: i64,
}

/// Decode the `exp` claim from a JWT without verifying the signature.
///
/// Returns `None` for opaque tokens, malformed payloads, or out-of-range
/// timestamps rather than failing the caller - an undecodable expiry just
/// means no auto-refresh can be scheduled for it.
pub fn decode_expiry(token: &str) -> Option<DateTime<Utc>> {
    let payload = token.split('.').nth(1)?;
    let decoded = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .ok()?;
    let claim: ExpiryClaim = serde_json::from_slice(&decoded).ok()?;
    Utc.timestamp_opt(claim.exp, 0).single()
}

/// Session-scoped token persistence.
///
/// Survives a "reload" of the embedding shell, not a process restart. The
/// default is purely in-memory; webview embedders can supply one backed by
/// their session storage.
pub trait TokenCache: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, token: &str);
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryTokenCache {
    token: Mutex<Option<String>>,
}

impl MemoryTokenCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenCache for MemoryTokenCache {
    fn load(&self) -> Option<String> {
        self.token.lock().expect("token cache lock poisoned").clone()
    }

    fn store(&self, token: &str) {
        *self.token.lock().expect("token cache lock poisoned") = Some(token.to_string());
    }

    fn clear(&self) {
        *self.token.lock().expect("token cache lock poisoned") = None;
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::jwt_expiring_in;
    use super::*;

    #[test]
    fn test_decode_expiry_roundtrip() {
        let token = jwt_expiring_in(300);
        let expiry = decode_expiry(&token).expect("expiry should decode");
        let delta = (expiry - Utc::now()).num_seconds();
        assert!((295..=305).contains(&delta), "delta was {}", delta);
    }

    #[test]
    fn test_decode_expiry_rejects_garbage() {
        assert!(decode_expiry("").is_none());
        assert!(decode_expiry("opaque-session-token").is_none());
        assert!(decode_expiry("a.b.c").is_none());
        assert!(decode_expiry("a.!!!not-base64!!!.c").is_none());

        // Valid base64, but no exp claim
        let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"u1"}"#);
        assert!(decode_expiry(&format!("h.{}.s", payload)).is_none());
    }

    #[test]
    fn test_access_token_expiry_state() {
        let live = AccessToken::new(jwt_expiring_in(600));
        assert!(!live.is_expired());
        assert!(live.expires_at.is_some());

        let dead = AccessToken::new(jwt_expiring_in(-60));
        assert!(dead.is_expired());

        // Opaque tokens never self-report expiry
        let opaque = AccessToken::new("opaque".to_string());
        assert!(!opaque.is_expired());
        assert!(opaque.expires_at.is_none());
    }

    #[test]
    fn test_memory_token_cache() {
        let cache = MemoryTokenCache::new();
        assert!(cache.load().is_none());

        cache.store("tok-1");
        assert_eq!(cache.load().as_deref(), Some("tok-1"));

        cache.clear();
        assert!(cache.load().is_none());
    }
}
