//! File-backed key-value settings document.
//!
//! The store is a single JSON object on disk. Reads and writes go against an
//! in-memory copy; `save` flushes the whole document. A JSON `null` is
//! treated the same as a missing key.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::ConfigError;

const APP_DIR: &str = "cohstats";
const STORE_FILE: &str = "config.dat";

#[derive(Debug, Default)]
pub struct ConfigStore {
    path: Option<PathBuf>,
    values: RwLock<Map<String, Value>>,
}

impl ConfigStore {
    /// Open the store at `path`, creating an empty document if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Map::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| ConfigError::Corrupt {
                path: path.clone(),
                source: e,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Settings file missing, creating it");
                let store = Self {
                    path: Some(path),
                    values: RwLock::new(Map::new()),
                };
                store.save().await?;
                return Ok(store);
            }
            Err(e) => return Err(ConfigError::Io { path, source: e }),
        };

        Ok(Self {
            path: Some(path),
            values: RwLock::new(values),
        })
    }

    /// A store that never touches the disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// `<config dir>/cohstats/config.dat`
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR).join(STORE_FILE))
            .ok_or(ConfigError::NoConfigDir)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Typed read. `Ok(None)` for a missing or null key.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.get_raw(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ConfigError::Value {
                    key: key.to_string(),
                    source: e,
                }),
        }
    }

    pub fn get_raw(&self, key: &str) -> Option<Value> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.get(key).filter(|v| !v.is_null()).cloned()
    }

    /// Write a value into the in-memory document, returning the previous one.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<Option<Value>, ConfigError> {
        let value = serde_json::to_value(value)?;
        Ok(self.set_raw(key, value))
    }

    pub fn set_raw(&self, key: &str, value: Value) -> Option<Value> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value)
    }

    /// Put back a value returned by [`set`](Self::set) after a failed save.
    pub(crate) fn restore(&self, key: &str, previous: Option<Value>) {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        match previous {
            Some(v) => values.insert(key.to_string(), v),
            None => values.remove(key),
        };
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        values.keys().cloned().collect()
    }

    /// Flush the document to disk (write to a sibling temp file, then rename).
    pub async fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let contents = {
            let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
            serde_json::to_vec_pretty(&*values)?
        };

        let io_err = |e| ConfigError::Io {
            path: path.clone(),
            source: e,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }
        let tmp = path.with_extension("dat.tmp");
        tokio::fs::write(&tmp, contents).await.map_err(io_err)?;
        tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.dat");

        let store = ConfigStore::open(&path).await.unwrap();
        assert!(path.exists());
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.dat");

        let store = ConfigStore::open(&path).await.unwrap();
        store.set("playSound", &false).unwrap();
        store.set("playSoundVolume", &0.5).unwrap();
        store.save().await.unwrap();

        let reopened = ConfigStore::open(&path).await.unwrap();
        assert_eq!(reopened.get::<bool>("playSound").unwrap(), Some(false));
        assert_eq!(reopened.get::<f64>("playSoundVolume").unwrap(), Some(0.5));
    }

    #[test]
    fn null_reads_as_missing() {
        let store = ConfigStore::in_memory();
        store.set_raw("logFilePath", Value::Null);
        assert_eq!(store.get::<String>("logFilePath").unwrap(), None);
    }

    #[test]
    fn wrong_shape_is_an_error() {
        let store = ConfigStore::in_memory();
        store.set("playSound", &"yes").unwrap();
        assert!(matches!(
            store.get::<bool>("playSound"),
            Err(ConfigError::Value { .. })
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.dat");
        std::fs::write(&path, "{not json").unwrap();

        let err = ConfigStore::open(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Corrupt { .. }));
    }

    #[test]
    fn restore_undoes_set() {
        let store = ConfigStore::in_memory();
        let prev = store.set("a", &1).unwrap();
        store.restore("a", prev);
        assert_eq!(store.get_raw("a"), None);
    }
}
