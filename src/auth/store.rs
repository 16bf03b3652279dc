//! Durable client-side store for the cached user snapshot.
//!
//! Survives a browserlike restart; only holds UI-convenience data (role,
//! department, permission list). Wiped on logout and on any refresh failure.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::debug;

use super::CachedUser;

/// User snapshot file name in the cache directory
const USER_FILE: &str = "user.json";

pub struct UserStore {
    cache_dir: PathBuf,
}

impl UserStore {
    pub fn new(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Load the persisted user snapshot, if any.
    pub fn load(&self) -> Result<Option<CachedUser>> {
        let path = self.user_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read cached user file")?;
        let user: CachedUser =
            serde_json::from_str(&contents).context("Failed to parse cached user file")?;
        Ok(Some(user))
    }

    pub fn save(&self, user: &CachedUser) -> Result<()> {
        let path = self.user_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(user)?;
        std::fs::write(&path, contents)?;
        debug!(username = %user.username, "Cached user snapshot saved");
        Ok(())
    }

    /// Remove the snapshot. Safe to call when nothing is stored.
    pub fn clear(&self) -> Result<()> {
        let path = self.user_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn user_path(&self) -> PathBuf {
        self.cache_dir.join(USER_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> CachedUser {
        CachedUser {
            id: 42,
            username: "rowan".to_string(),
            role: "admin".to_string(),
            department: None,
            permissions: vec!["users.manage".to_string()],
        }
    }

    #[test]
    fn test_save_load_clear_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path().to_path_buf());

        assert!(store.load().unwrap().is_none());

        store.save(&sample_user()).unwrap();
        let loaded = store.load().unwrap().expect("snapshot should exist");
        assert_eq!(loaded, sample_user());

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Idempotent
        store.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path().to_path_buf());
        std::fs::write(dir.path().join("user.json"), "{not json").unwrap();
        assert!(store.load().is_err());
    }
}
