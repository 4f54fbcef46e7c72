use crate::{
    client::PurchasesClient,
    config::Config,
    error::{LoadProductsError, PurchaseError, RestoreError},
    lifecycle::{observe_foreground, AppLifecycleEvent},
    models::{Product, ProductId, PurchaseState, Transaction},
    services::{
        events::EventSubscription,
        receipt_validator::{AppleReceiptValidator, ReceiptValidator},
        storage::{FileStorage, KeyValueStorage},
        storefront::Storefront,
        PurchasesService,
    },
};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::info;

/// App-facing purchases client.
///
/// Wraps the reconciliation service and owns the lifecycle channel; `setup`
/// starts the foreground observer the first time it runs.
pub struct PurchasesContext<St, V, K> {
    service: Arc<PurchasesService<St, V, K>>,
    lifecycle_tx: mpsc::UnboundedSender<AppLifecycleEvent>,
    lifecycle_rx: Mutex<Option<mpsc::UnboundedReceiver<AppLifecycleEvent>>>,
    observer: Mutex<Option<JoinHandle<()>>>,
}

impl<St: Storefront + 'static> PurchasesContext<St, AppleReceiptValidator, FileStorage> {
    /// Wire file storage and the App Store validator from configuration
    pub async fn from_config(config: &Config, storefront: St) -> Result<Self, anyhow::Error> {
        let storage = FileStorage::open(&config.storage.path).await?;
        let validator = AppleReceiptValidator::new(&config.store)?;

        let service = PurchasesService::new(
            storefront,
            validator,
            storage,
            config.storage.state_key.clone(),
        )
        .await?;

        info!(
            "Purchases client ready (environment={:?}, storage={})",
            config.store.environment,
            config.storage.path.display()
        );

        Ok(Self::new(Arc::new(service)))
    }
}

impl<St, V, K> PurchasesContext<St, V, K>
where
    St: Storefront + 'static,
    V: ReceiptValidator + 'static,
    K: KeyValueStorage + 'static,
{
    pub fn new(service: Arc<PurchasesService<St, V, K>>) -> Self {
        let (lifecycle_tx, lifecycle_rx) = mpsc::unbounded_channel();
        Self {
            service,
            lifecycle_tx,
            lifecycle_rx: Mutex::new(Some(lifecycle_rx)),
            observer: Mutex::new(None),
        }
    }

    pub fn service(&self) -> &Arc<PurchasesService<St, V, K>> {
        &self.service
    }

    /// Sender the host uses to forward lifecycle notifications
    pub fn lifecycle(&self) -> mpsc::UnboundedSender<AppLifecycleEvent> {
        self.lifecycle_tx.clone()
    }

    fn start_observer(&self) {
        let receiver = self
            .lifecycle_rx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();

        if let Some(mut receiver) = receiver {
            // Setup just verified; notifications sent before it are stale
            while receiver.try_recv().is_ok() {}

            let handle = observe_foreground(&self.service, receiver);
            *self
                .observer
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(handle);
        }
    }
}

impl<St, V, K> Drop for PurchasesContext<St, V, K> {
    fn drop(&mut self) {
        if let Ok(mut observer) = self.observer.lock() {
            if let Some(handle) = observer.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl<St, V, K> PurchasesClient for PurchasesContext<St, V, K>
where
    St: Storefront + 'static,
    V: ReceiptValidator + 'static,
    K: KeyValueStorage + 'static,
{
    fn state(&self) -> PurchaseState {
        self.service.state()
    }

    fn subscribe(&self) -> EventSubscription {
        self.service.subscribe()
    }

    async fn setup(&self) {
        self.service.setup().await;
        self.start_observer();
    }

    async fn will_enter_foreground(&self) {
        self.service.will_enter_foreground().await;
    }

    async fn load_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LoadProductsError> {
        self.service.load_products(ids).await
    }

    async fn restore_purchases(&self) -> Result<Vec<ProductId>, RestoreError> {
        self.service.restore_purchases().await
    }

    async fn purchase_product(&self, id: &ProductId) -> Result<Transaction, PurchaseError> {
        self.service.purchase_product(id).await
    }
}
