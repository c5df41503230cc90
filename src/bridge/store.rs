use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::config::{merge_over_defaults, Settings, SETTINGS_KEY};
use crate::utils::error::{TocError, TocResult};

/// External key-value store holding user preferences.
///
/// Values are JSON. The store is assumed to be synchronized across the
/// user's sessions and only eventually consistent.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Value stored under `key`; `None` when the key was never written
    async fn get(&self, key: &str) -> TocResult<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> TocResult<()>;
}

/// Read the settings bundle and merge it over the defaults.
///
/// A failing store or an unusable bundle degrades to the defaults.
pub async fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.get(SETTINGS_KEY).await {
        Ok(Some(value)) => merge_over_defaults(&value).unwrap_or_else(|e| {
            warn!("Stored settings unusable, using defaults: {}", e);
            Settings::default()
        }),
        Ok(None) => {
            debug!("No stored settings, using defaults");
            Settings::default()
        }
        Err(e) => {
            warn!("Failed to read settings, using defaults: {}", e);
            Settings::default()
        }
    }
}

/// Store kept in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with one entry
    pub fn with_value(key: &str, value: Value) -> Self {
        let mut values = HashMap::new();
        values.insert(key.to_string(), value);
        MemoryStore {
            values: RwLock::new(values),
        }
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get(&self, key: &str) -> TocResult<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> TocResult<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// Store persisted as one JSON object in a file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    // serializes read-modify-write cycles within this process
    lock: tokio::sync::Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        FileStore {
            path: path.as_ref().to_path_buf(),
            lock: tokio::sync::Mutex::new(()),
        }
    }

    /// `<config dir>/smart-toc/settings.json`
    pub fn default_location() -> TocResult<Self> {
        let dir = dirs::config_dir()
            .ok_or_else(|| TocError::Store("No user configuration directory".to_string()))?;
        Ok(Self::new(dir.join("smart-toc").join("settings.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> TocResult<Map<String, Value>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(TocError::Store(format!(
                    "Failed to read {}: {}", self.path.display(), e
                )))
            }
        };

        match serde_json::from_str(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(TocError::Store(format!(
                "{} does not hold a JSON object", self.path.display()
            ))),
            Err(e) => Err(TocError::Store(format!(
                "Failed to parse {}: {}", self.path.display(), e
            ))),
        }
    }
}

#[async_trait]
impl SettingsStore for FileStore {
    async fn get(&self, key: &str) -> TocResult<Option<Value>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> TocResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(&Value::Object(all))?;
        tokio::fs::write(&self.path, content).await?;

        debug!("Stored {} in {}", key, self.path.display());
        Ok(())
    }
}
