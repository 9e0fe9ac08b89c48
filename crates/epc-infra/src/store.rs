//! `JsonFileStore`: a `PersistentStore` backed by a single JSON file on
//! disk, for hosts without a platform key/value store of their own.

use crate::error::InfraError;
use epc_core::{PersistentStore, StoreError};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Self::load(&path).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "store file unreadable; starting from an empty store");
            Map::new()
        });
        Self { path, data: Mutex::new(data) }
    }

    pub fn from_env() -> Self {
        Self::new(crate::config::StoreConfig::from_env().path)
    }

    fn load(path: &Path) -> Result<Map<String, Value>, InfraError> {
        match std::fs::read_to_string(path) {
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(source) => Err(InfraError::Read { path: path.display().to_string(), source }),
        }
    }

    fn persist(&self, data: &Map<String, Value>) -> Result<(), InfraError> {
        let serialised = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, serialised)
            .map_err(|source| InfraError::Write { path: self.path.display().to_string(), source })
    }
}

impl PersistentStore for JsonFileStore {
    fn get_persistent(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.data.lock().unwrap().get(key).cloned())
    }

    fn set_persistent(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.insert(key.to_string(), value);
        self.persist(&data).map_err(|err| StoreError(err.to_string()))
    }

    fn del_persistent(&self, key: &str) -> Result<(), StoreError> {
        let mut data = self.data.lock().unwrap();
        data.remove(key);
        self.persist(&data).map_err(|err| StoreError(err.to_string()))
    }
}
