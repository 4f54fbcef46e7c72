use crate::{
    client::PurchasesClient,
    error::{LoadProductsError, PurchaseError, RestoreError, StorageError},
    models::{Product, ProductId, PurchaseState, PurchaseStatus, PurchasesEvent, Transaction},
    services::{
        events::{EventPublisher, EventSubscription},
        product_cache::ProductCache,
        receipt_validator::ReceiptValidator,
        state_store::PurchaseStateStore,
        storage::KeyValueStorage,
        storefront::Storefront,
        verification::verify_product,
    },
};
use async_trait::async_trait;
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};

/// Reconciles the persisted entitlement map with the store.
///
/// Three sources feed the state: pending transactions drained on setup,
/// receipt verification (setup and every foreground re-entry), and explicit
/// purchase / restore calls. All of them merge, none deletes.
pub struct PurchasesService<St, V, K> {
    storefront: St,
    validator: V,
    state: PurchaseStateStore<K>,
    cache: ProductCache,
    events: Arc<EventPublisher>,
}

impl<St, V, K> PurchasesService<St, V, K>
where
    St: Storefront,
    V: ReceiptValidator,
    K: KeyValueStorage,
{
    pub async fn new(
        storefront: St,
        validator: V,
        storage: K,
        state_key: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let events = Arc::new(EventPublisher::new());
        let state = PurchaseStateStore::load(storage, state_key, events.clone()).await?;

        Ok(Self {
            storefront,
            validator,
            state,
            cache: ProductCache::new(),
            events,
        })
    }

    pub fn storefront(&self) -> &St {
        &self.storefront
    }

    pub fn validator(&self) -> &V {
        &self.validator
    }

    async fn merge_state<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (ProductId, PurchaseStatus)>,
    {
        if let Err(e) = self.state.merge(entries).await {
            warn!("Failed to persist purchase state: {}", e);
        }
    }

    /// Mark products of completed or restored pending transactions as purchased
    #[instrument(skip(self))]
    async fn proceed_purchases(&self) {
        let completed: Vec<ProductId> = self
            .storefront
            .complete_transactions()
            .await
            .into_iter()
            .filter(|purchase| purchase.transaction_state.is_completed())
            .map(|purchase| purchase.product_id)
            .collect();

        self.merge_state(
            completed
                .iter()
                .map(|id| (id.clone(), PurchaseStatus::Purchased)),
        )
        .await;

        info!("Proceeded {} pending transaction(s)", completed.len());

        self.events
            .publish(PurchasesEvent::DidProceedProducts(completed));
    }

    /// Recompute the status of every product found in the receipt
    #[instrument(skip(self))]
    async fn validate_purchases(&self) {
        let receipt = match self.validator.verify_receipt().await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!("Receipt verification failed: {}", e);
                return;
            }
        };

        let Some(ids) = receipt.distinct_product_ids() else {
            debug!("Receipt contains no purchases");
            return;
        };
        let ids: Vec<ProductId> = ids.into_iter().collect();

        let products = match self.fetch_products(&ids).await {
            Ok(products) => products,
            Err(e) => {
                warn!("Failed to load products for verification: {}", e);
                return;
            }
        };

        let now = OffsetDateTime::now_utc();
        let verified: Vec<(ProductId, PurchaseStatus)> = products
            .iter()
            .map(|product| (product.id.clone(), verify_product(product, &receipt, now)))
            .collect();

        info!("Verified {} product(s) from receipt", verified.len());

        self.merge_state(verified).await;
    }

    async fn fetch_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LoadProductsError> {
        let lookup = self.cache.lookup(ids);
        if lookup.missing.is_empty() {
            debug!("All {} product(s) served from cache", lookup.cached.len());
            return Ok(lookup.cached);
        }

        let missing: BTreeSet<ProductId> = lookup.missing.into_iter().collect();
        let results = self.storefront.retrieve_products(&missing).await;

        let fetched: Vec<Product> = results
            .retrieved_products
            .into_iter()
            .filter(|product| missing.contains(&product.product_identifier))
            .map(Product::from)
            .collect();
        self.cache.insert_all(&fetched);

        if !results.invalid_product_ids.is_empty() {
            debug!("Store rejected product ids: {:?}", results.invalid_product_ids);
        }

        let mut resolved: HashMap<ProductId, Product> = lookup
            .cached
            .into_iter()
            .chain(fetched)
            .map(|product| (product.id.clone(), product))
            .collect();
        let products: Vec<Product> = ids.iter().filter_map(|id| resolved.remove(id)).collect();

        match results.error {
            Some(error) if products.is_empty() => Err(error.into()),
            Some(error) => {
                warn!(
                    "Product lookup partially failed, returning {} product(s): {}",
                    products.len(),
                    error
                );
                Ok(products)
            }
            None => Ok(products),
        }
    }
}

#[async_trait]
impl<St, V, K> PurchasesClient for PurchasesService<St, V, K>
where
    St: Storefront,
    V: ReceiptValidator,
    K: KeyValueStorage,
{
    fn state(&self) -> PurchaseState {
        self.state.state()
    }

    fn subscribe(&self) -> EventSubscription {
        self.events.subscribe()
    }

    async fn setup(&self) {
        self.proceed_purchases().await;
        self.validate_purchases().await;
    }

    async fn will_enter_foreground(&self) {
        self.validate_purchases().await;
    }

    #[instrument(skip(self))]
    async fn load_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LoadProductsError> {
        self.fetch_products(ids).await
    }

    #[instrument(skip(self))]
    async fn restore_purchases(&self) -> Result<Vec<ProductId>, RestoreError> {
        let results = self.storefront.restore_purchases().await.map_err(|e| {
            warn!("Restore request failed: {}", e);
            RestoreError::Unknown
        })?;

        if results.restored_purchases.is_empty() {
            let failed = results.restore_failed_purchases.len();
            return Err(if failed > 0 {
                warn!("Failed to restore {} purchase(s)", failed);
                RestoreError::FailedToRestore
            } else {
                RestoreError::NothingToRestore
            });
        }

        let mut restored_ids: Vec<ProductId> = Vec::new();
        for purchase in results.restored_purchases {
            if !restored_ids.contains(&purchase.product_id) {
                restored_ids.push(purchase.product_id);
            }
        }

        self.merge_state(
            restored_ids
                .iter()
                .map(|id| (id.clone(), PurchaseStatus::Purchased)),
        )
        .await;

        info!("Restored products: {:?}", restored_ids);

        self.events
            .publish(PurchasesEvent::DidRestoreProducts(restored_ids.clone()));

        Ok(restored_ids)
    }

    #[instrument(skip(self))]
    async fn purchase_product(&self, id: &ProductId) -> Result<Transaction, PurchaseError> {
        let details = self.storefront.purchase_product(id).await.map_err(|e| {
            warn!("Purchase of {} failed: {}", id, e);
            PurchaseError::from(&e)
        })?;

        self.merge_state([(details.product_id().clone(), PurchaseStatus::Purchased)])
            .await;

        let transaction = Transaction {
            product: Product::from(details.product),
            quantity: Some(details.quantity),
            transaction_identifier: details.transaction_identifier,
        };

        info!(
            "Purchased {} (transaction={:?})",
            transaction.product_id(),
            transaction.transaction_identifier
        );

        self.events
            .publish(PurchasesEvent::DidPurchaseProduct(transaction.clone()));

        Ok(transaction)
    }
}
