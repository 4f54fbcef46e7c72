use crate::error::StorageError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use std::{
    collections::{BTreeMap, HashMap},
    path::PathBuf,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Persistent key-value storage backing the purchase state.
///
/// `set` may buffer; `flush` must make every buffered write durable.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    async fn flush(&self) -> Result<(), StorageError>;
}

/// Volatile storage, used by tests and hosts without a persistent store
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with a single record
    pub fn with_value(key: impl Into<String>, value: Vec<u8>) -> Self {
        let mut values = HashMap::new();
        values.insert(key.into(), value);
        Self {
            values: Mutex::new(values),
        }
    }
}

#[async_trait]
impl KeyValueStorage for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn flush(&self) -> Result<(), StorageError> {
        Ok(())
    }
}

struct FileState {
    values: BTreeMap<String, String>,
    dirty: bool,
}

/// JSON file storage; values are base64-encoded under their key.
///
/// Writes are buffered in memory until `flush`, which replaces the file
/// atomically via a temporary sibling.
pub struct FileStorage {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl FileStorage {
    /// Open the storage file, starting empty when it is missing or unreadable
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, String>>(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Ignoring malformed storage file {}: {}", path.display(), e);
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        info!(
            "FileStorage opened at {} with {} record(s)",
            path.display(),
            values.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(FileState {
                values,
                dirty: false,
            }),
        })
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let state = self.state.lock().await;
        let Some(encoded) = state.values.get(key) else {
            return Ok(None);
        };

        STANDARD
            .decode(encoded)
            .map(Some)
            .map_err(|e| StorageError::InvalidValue {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    async fn set(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        state.values.insert(key.to_string(), STANDARD.encode(value));
        state.dirty = true;
        Ok(())
    }

    async fn flush(&self) -> Result<(), StorageError> {
        let mut state = self.state.lock().await;
        if !state.dirty {
            return Ok(());
        }

        let bytes = serde_json::to_vec_pretty(&state.values)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let tmp_path = self.path.with_extension("tmp");
        tokio::fs::write(&tmp_path, &bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        state.dirty = false;

        debug!("Flushed {} bytes to {}", bytes.len(), self.path.display());

        Ok(())
    }
}
