use crate::{
    error::{StoreError, StoreErrorCode},
    models::{PeriodUnit, Product, ProductId, PurchasePeriod, StoreProduct, SubscriptionPeriod},
};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Outcome of a product metadata lookup
#[derive(Debug, Clone, Default)]
pub struct RetrieveResults {
    pub retrieved_products: Vec<StoreProduct>,
    pub invalid_product_ids: Vec<ProductId>,
    pub error: Option<StoreError>,
}

/// Store-side state of a pending transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Purchasing,
    Purchased,
    Failed,
    Restored,
    Deferred,
}

impl TransactionState {
    /// Whether the transaction grants an entitlement
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Purchased | Self::Restored)
    }
}

/// Transaction delivered by the store outside of an explicit purchase call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPurchase {
    pub product_id: ProductId,
    pub quantity: u32,
    pub transaction_state: TransactionState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoredPurchase {
    pub product_id: ProductId,
    pub transaction_identifier: Option<String>,
}

/// Outcome of a store restore request
#[derive(Debug, Clone, Default)]
pub struct RestoreResults {
    pub restored_purchases: Vec<RestoredPurchase>,
    pub restore_failed_purchases: Vec<(StoreError, Option<ProductId>)>,
}

/// Details of a completed store purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseDetails {
    pub product: StoreProduct,
    pub quantity: u32,
    pub transaction_identifier: Option<String>,
}

impl PurchaseDetails {
    pub fn product_id(&self) -> &ProductId {
        &self.product.product_identifier
    }
}

/// Platform store API
#[async_trait]
pub trait Storefront: Send + Sync {
    async fn retrieve_products(&self, ids: &BTreeSet<ProductId>) -> RetrieveResults;

    /// Restore previously purchased products. An `Err` means the request
    /// itself failed, before any per-product outcome was known.
    async fn restore_purchases(&self) -> Result<RestoreResults, StoreError>;

    async fn purchase_product(&self, id: &ProductId) -> Result<PurchaseDetails, StoreError>;

    /// Deliver transactions that completed while the app was not observing
    async fn complete_transactions(&self) -> Vec<PendingPurchase>;
}

/// Storefront serving product metadata from a fixed catalog.
///
/// Payments are unavailable and there are never pending transactions; used
/// when a host only needs to reconcile an existing receipt.
pub struct OfflineStorefront {
    catalog: HashMap<ProductId, Product>,
}

impl OfflineStorefront {
    pub fn new(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            catalog: products
                .into_iter()
                .map(|product| (product.id.clone(), product))
                .collect(),
        }
    }

    fn store_product(product: &Product) -> StoreProduct {
        let subscription_period = match product.period {
            PurchasePeriod::Week => Some(SubscriptionPeriod::new(PeriodUnit::Week, 1)),
            PurchasePeriod::Month => Some(SubscriptionPeriod::new(PeriodUnit::Month, 1)),
            PurchasePeriod::Year => Some(SubscriptionPeriod::new(PeriodUnit::Year, 1)),
            PurchasePeriod::Lifetime => None,
        };

        StoreProduct {
            product_identifier: product.id.clone(),
            price_micros: product.price.amount_micros,
            currency_code: product.price.currency_code.clone(),
            price_locale: product.price.locale.clone(),
            subscription_period,
            introductory_period: product
                .discount
                .map(|d| SubscriptionPeriod::new(PeriodUnit::Day, d.trial_days)),
        }
    }
}

#[async_trait]
impl Storefront for OfflineStorefront {
    async fn retrieve_products(&self, ids: &BTreeSet<ProductId>) -> RetrieveResults {
        let mut results = RetrieveResults::default();
        for id in ids {
            match self.catalog.get(id) {
                Some(product) => results.retrieved_products.push(Self::store_product(product)),
                None => results.invalid_product_ids.push(id.clone()),
            }
        }

        debug!(
            "Offline catalog resolved {} of {} product(s)",
            results.retrieved_products.len(),
            ids.len()
        );

        results
    }

    async fn restore_purchases(&self) -> Result<RestoreResults, StoreError> {
        Err(StoreError::new(
            StoreErrorCode::PaymentNotAllowed,
            "offline storefront cannot restore purchases",
        ))
    }

    async fn purchase_product(&self, id: &ProductId) -> Result<PurchaseDetails, StoreError> {
        Err(StoreError::new(
            StoreErrorCode::PaymentNotAllowed,
            format!("offline storefront cannot purchase {}", id),
        ))
    }

    async fn complete_transactions(&self) -> Vec<PendingPurchase> {
        Vec::new()
    }
}
