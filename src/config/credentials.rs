//! API-key credential store.
//!
//! Holds the Anthropic API key in memory with optional persistence to a
//! small JSON file under the platform config directory. The
//! `ANTHROPIC_API_KEY` environment variable overrides the persisted value
//! for the current process without touching disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

const API_KEY_PREFIX: &str = "sk-ant-";

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PersistedCredentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

#[derive(Debug)]
pub struct CredentialStore {
    api_key: RwLock<Option<String>>,
    path: PathBuf,
}

impl CredentialStore {
    /// Load the store: persisted file first, then the environment override.
    pub fn load(path: Option<PathBuf>) -> Self {
        let path = path.unwrap_or_else(default_credentials_path);
        let mut api_key = read_persisted(&path);

        match std::env::var("ANTHROPIC_API_KEY") {
            Ok(env_key) if !env_key.trim().is_empty() => {
                api_key = Some(env_key.trim().to_string());
            }
            _ => {}
        }

        Self {
            api_key: RwLock::new(api_key),
            path,
        }
    }

    /// An empty store that never touches disk or the environment. Used for
    /// offline play and tests.
    pub fn ephemeral() -> Self {
        Self {
            api_key: RwLock::new(None),
            path: PathBuf::from("credentials.json"),
        }
    }

    pub fn get_api_key(&self) -> Option<String> {
        self.api_key.read().ok().and_then(|guard| guard.clone())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key
            .read()
            .map(|guard| guard.is_some())
            .unwrap_or(false)
    }

    /// Store a key in memory and, when `persist` is set, on disk.
    pub fn set_api_key(&self, key: &str, persist: bool) -> anyhow::Result<()> {
        let key = key.trim();
        if !Self::looks_like_api_key(key) {
            anyhow::bail!("API key must start with \"{API_KEY_PREFIX}\"");
        }

        if let Ok(mut guard) = self.api_key.write() {
            *guard = Some(key.to_string());
        }

        if persist {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let doc = PersistedCredentials {
                api_key: Some(key.to_string()),
            };
            std::fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
            tracing::info!(path = %self.path.display(), "Persisted API key");
        }

        Ok(())
    }

    pub fn looks_like_api_key(key: &str) -> bool {
        key.starts_with(API_KEY_PREFIX) && key.len() > API_KEY_PREFIX.len()
    }
}

fn read_persisted(path: &Path) -> Option<String> {
    let contents = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str::<PersistedCredentials>(&contents) {
        Ok(doc) => doc.api_key.filter(|k| !k.trim().is_empty()),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "Ignoring malformed credentials file");
            None
        }
    }
}

fn default_credentials_path() -> PathBuf {
    let base = if cfg!(windows) {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
    };

    base.unwrap_or_else(|| PathBuf::from("."))
        .join("quipwits")
        .join("credentials.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix_check() {
        assert!(CredentialStore::looks_like_api_key("sk-ant-abc123"));
        assert!(!CredentialStore::looks_like_api_key("sk-ant-"));
        assert!(!CredentialStore::looks_like_api_key("sk-openai-abc"));
        assert!(!CredentialStore::looks_like_api_key(""));
    }

    #[test]
    fn test_set_and_get_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(Some(dir.path().join("credentials.json")));
        assert!(store.set_api_key("sk-ant-test123", false).is_ok());
        assert_eq!(store.get_api_key().as_deref(), Some("sk-ant-test123"));
        assert!(store.has_api_key());
    }

    #[test]
    fn test_persist_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let store = CredentialStore::load(Some(path.clone()));
        store.set_api_key("sk-ant-persisted", true).unwrap();

        let persisted = read_persisted(&path);
        assert_eq!(persisted.as_deref(), Some("sk-ant-persisted"));
    }

    #[test]
    fn test_rejects_malformed_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::load(Some(dir.path().join("credentials.json")));
        assert!(store.set_api_key("not-a-key", false).is_err());
        assert_ne!(store.get_api_key().as_deref(), Some("not-a-key"));
    }
}
