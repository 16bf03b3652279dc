//! Optional remember-me credential storage.
//!
//! The password goes into the OS keychain; the username goes into the
//! file-backed [`Config`] so the next launch knows which keychain entry to
//! look up. Neither is required for normal operation - callers that manage
//! credentials themselves never touch this.

use anyhow::{Context, Result};
use keyring::Entry;

use crate::config::Config;

const SERVICE_NAME: &str = "campus-client";

pub struct CredentialStore;

impl CredentialStore {
    /// Remember a login: password in the keychain, username in the config.
    pub fn remember(username: &str, password: &str) -> Result<()> {
        let entry =
            Entry::new(SERVICE_NAME, username).context("Failed to create keyring entry")?;
        entry
            .set_password(password)
            .context("Failed to store password in keychain")?;

        let mut config = Config::load().unwrap_or_default();
        config.last_username = Some(username.to_string());
        config.save()?;
        Ok(())
    }

    /// Retrieve the remembered username/password pair, if both halves exist.
    pub fn remembered() -> Option<(String, String)> {
        let username = Config::load().ok()?.last_username?;
        let entry = Entry::new(SERVICE_NAME, &username).ok()?;
        let password = entry.get_password().ok()?;
        Some((username, password))
    }

    /// Drop the remembered credentials. The keychain entry and the config
    /// record are cleared independently; a missing half is not an error.
    pub fn forget() -> Result<()> {
        let mut config = Config::load().unwrap_or_default();
        if let Some(username) = config.last_username.take() {
            if let Ok(entry) = Entry::new(SERVICE_NAME, &username) {
                let _ = entry.delete_credential();
            }
            config.save()?;
        }
        Ok(())
    }
}
