//! Persisted kiosk URL.
//!
//! The only state that survives a restart is a single string stored under
//! [`URL_KEY`]. [`UrlStore`] wraps any [`SettingsStore`] backend and enforces
//! the non-empty invariant by falling back to [`DEFAULT_URL`].

use crate::error::StoreError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key under which the configured URL is persisted.
pub const URL_KEY: &str = "kiosk_url";

/// Destination used until a URL has been configured.
pub const DEFAULT_URL: &str = "http://homeassistant.local:8123";

/// Abstract key-value persistence backend.
pub trait SettingsStore: Send {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Volatile backend, used by tests and as a fallback when the settings file
/// cannot be opened.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    values: BTreeMap<String, String>,
}

impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// TOML-backed string table on disk.
///
/// Writes land in memory before touching the file, so a failed flush still
/// serves the new value for the rest of the session.
#[derive(Debug)]
pub struct FileSettingsStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettingsStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|source| StoreError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&contents).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let contents = toml::to_string_pretty(&self.values)?;
        fs::write(&self.path, contents).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for FileSettingsStore {
    fn read(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        self.flush()
    }
}

/// The configured kiosk destination.
pub struct UrlStore {
    backend: Box<dyn SettingsStore>,
}

impl UrlStore {
    pub fn new(backend: Box<dyn SettingsStore>) -> Self {
        Self { backend }
    }

    /// The persisted URL, or [`DEFAULT_URL`] if none was ever saved.
    pub fn get(&self) -> String {
        self.backend
            .read(URL_KEY)
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_URL.to_string())
    }

    /// Overwrite the persisted URL. Callers guarantee `url` is non-empty.
    pub fn set(&mut self, url: &str) -> Result<(), StoreError> {
        self.backend.write(URL_KEY, url)
    }
}

impl std::fmt::Debug for UrlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UrlStore").field("url", &self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kiosk-pin-store-{}-{}",
            name,
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_default_until_set() {
        let mut store = UrlStore::new(Box::new(MemorySettingsStore::new()));
        assert_eq!(store.get(), DEFAULT_URL);

        store.set("http://panel.local").unwrap();
        assert_eq!(store.get(), "http://panel.local");

        store.set("http://other.local").unwrap();
        assert_eq!(store.get(), "http://other.local");
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = scratch_dir("reopen");
        let path = dir.join("settings.toml");

        let mut store = UrlStore::new(Box::new(FileSettingsStore::open(&path).unwrap()));
        assert_eq!(store.get(), DEFAULT_URL);
        store.set("https://ha.lan:8123").unwrap();

        let reopened = UrlStore::new(Box::new(FileSettingsStore::open(&path).unwrap()));
        assert_eq!(reopened.get(), "https://ha.lan:8123");

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("kiosk_url"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = scratch_dir("garbage");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(&path, "kiosk_url = [1, 2").unwrap();

        let err = FileSettingsStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Parse { .. }));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_blank_value_falls_back_to_default() {
        let mut backend = MemorySettingsStore::new();
        backend.write(URL_KEY, "   ").unwrap();
        let store = UrlStore::new(Box::new(backend));
        assert_eq!(store.get(), DEFAULT_URL);
    }
}
