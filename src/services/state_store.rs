use crate::{
    error::StorageError,
    models::{ProductId, PurchaseState, PurchaseStatus, PurchasesEvent},
    services::{events::EventPublisher, storage::KeyValueStorage},
};
use std::sync::{Arc, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Persisted purchase state with merge-only updates.
///
/// Writers are serialized; each merge persists the full map, then publishes
/// `DidChangeState` while still holding the write lock so subscribers observe
/// states in mutation order.
pub struct PurchaseStateStore<K> {
    storage: K,
    key: String,
    current: RwLock<PurchaseState>,
    write_lock: Mutex<()>,
    events: Arc<EventPublisher>,
}

impl<K: KeyValueStorage> PurchaseStateStore<K> {
    /// Load the persisted record.
    ///
    /// A missing, malformed or undecodable record yields an empty state; only
    /// storage failures such as I/O errors are returned.
    pub async fn load(
        storage: K,
        key: impl Into<String>,
        events: Arc<EventPublisher>,
    ) -> Result<Self, StorageError> {
        let key = key.into();

        let state = match storage.get(&key).await {
            Ok(Some(bytes)) => decode_state(&key, &bytes),
            Ok(None) => PurchaseState::new(),
            Err(StorageError::InvalidValue { reason, .. }) => {
                warn!("Discarding undecodable purchase state under {}: {}", key, reason);
                PurchaseState::new()
            }
            Err(e) => return Err(e),
        };

        debug!("Loaded purchase state with {} product(s)", state.len());

        Ok(Self {
            storage,
            key,
            current: RwLock::new(state),
            write_lock: Mutex::new(()),
            events,
        })
    }

    /// Snapshot of the current state
    pub fn state(&self) -> PurchaseState {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Merge entries and persist the result.
    ///
    /// The in-memory state and the `DidChangeState` event reflect the merge
    /// even when persisting fails; the storage error is returned to the caller.
    pub async fn merge<I>(&self, entries: I) -> Result<PurchaseState, StorageError>
    where
        I: IntoIterator<Item = (ProductId, PurchaseStatus)>,
    {
        let _guard = self.write_lock.lock().await;

        let next = {
            let mut current = self
                .current
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            current.merge(entries);
            current.clone()
        };

        let persisted = self.persist(&next).await;
        self.events
            .publish(PurchasesEvent::DidChangeState(next.clone()));

        persisted.map(|_| next)
    }

    async fn persist(&self, state: &PurchaseState) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(state)?;
        self.storage.set(&self.key, bytes).await?;
        self.storage.flush().await
    }
}

fn decode_state(key: &str, bytes: &[u8]) -> PurchaseState {
    match serde_json::from_slice(bytes) {
        Ok(state) => state,
        Err(e) => {
            warn!("Discarding malformed purchase state under {}: {}", key, e);
            PurchaseState::new()
        }
    }
}
