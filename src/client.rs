use crate::{
    error::{LoadProductsError, PurchaseError, RestoreError},
    models::{Product, ProductId, PurchaseState, Transaction},
    services::events::EventSubscription,
};
use async_trait::async_trait;

/// Purchase-management surface consumed by the app.
///
/// Implementations keep a persisted entitlement map in sync with the store
/// and report every change through [`PurchasesClient::subscribe`].
#[async_trait]
pub trait PurchasesClient: Send + Sync {
    /// Current entitlement map
    fn state(&self) -> PurchaseState;

    /// Register a new event subscriber
    fn subscribe(&self) -> EventSubscription;

    /// Drain pending transactions, then re-verify the receipt
    async fn setup(&self);

    /// Re-verify the receipt after the app returns to foreground
    async fn will_enter_foreground(&self);

    async fn load_products(&self, ids: &[ProductId]) -> Result<Vec<Product>, LoadProductsError>;

    async fn restore_purchases(&self) -> Result<Vec<ProductId>, RestoreError>;

    async fn purchase_product(&self, id: &ProductId) -> Result<Transaction, PurchaseError>;
}
