use async_trait::async_trait;
use pocket_purchases::{
    error::{StoreError, StoreErrorCode, VerifyError},
    models::{
        PeriodUnit, ProductId, Receipt, ReceiptEntry, StoreProduct, SubscriptionPeriod,
    },
    services::{
        storefront::{PendingPurchase, PurchaseDetails, RestoreResults, RetrieveResults},
        MemoryStorage, PurchasesService, ReceiptValidator, Storefront,
    },
};
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};
use time::{Duration, OffsetDateTime};

pub const STATE_KEY: &str = "test.purchases-state";

pub type TestService = PurchasesService<FakeStorefront, FakeValidator, MemoryStorage>;

/// Scriptable storefront double that records how it was called
#[derive(Default)]
pub struct FakeStorefront {
    products: Mutex<HashMap<ProductId, StoreProduct>>,
    retrieve_error: Mutex<Option<StoreError>>,
    restore_result: Mutex<Option<Result<RestoreResults, StoreError>>>,
    purchase_error: Mutex<Option<StoreError>>,
    pending: Mutex<Vec<PendingPurchase>>,
    requested: Mutex<Vec<BTreeSet<ProductId>>>,
    complete_calls: AtomicUsize,
}

impl FakeStorefront {
    pub fn with_products(products: impl IntoIterator<Item = StoreProduct>) -> Self {
        let storefront = Self::default();
        storefront.products.lock().unwrap().extend(
            products
                .into_iter()
                .map(|product| (product.product_identifier.clone(), product)),
        );
        storefront
    }

    pub fn fail_retrieval(&self, error: StoreError) {
        *self.retrieve_error.lock().unwrap() = Some(error);
    }

    pub fn set_restore_result(&self, result: Result<RestoreResults, StoreError>) {
        *self.restore_result.lock().unwrap() = Some(result);
    }

    pub fn fail_purchase(&self, code: StoreErrorCode) {
        *self.purchase_error.lock().unwrap() = Some(StoreError::new(code, "scripted failure"));
    }

    pub fn set_pending(&self, pending: Vec<PendingPurchase>) {
        *self.pending.lock().unwrap() = pending;
    }

    pub fn retrieve_calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<BTreeSet<ProductId>> {
        self.requested.lock().unwrap().clone()
    }

    pub fn complete_calls(&self) -> usize {
        self.complete_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storefront for FakeStorefront {
    async fn retrieve_products(&self, ids: &BTreeSet<ProductId>) -> RetrieveResults {
        self.requested.lock().unwrap().push(ids.clone());

        let products = self.products.lock().unwrap();
        let mut results = RetrieveResults {
            error: self.retrieve_error.lock().unwrap().clone(),
            ..Default::default()
        };
        for id in ids {
            match products.get(id) {
                Some(product) => results.retrieved_products.push(product.clone()),
                None => results.invalid_product_ids.push(id.clone()),
            }
        }
        results
    }

    async fn restore_purchases(&self) -> Result<RestoreResults, StoreError> {
        self.restore_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(RestoreResults::default()))
    }

    async fn purchase_product(&self, id: &ProductId) -> Result<PurchaseDetails, StoreError> {
        if let Some(error) = self.purchase_error.lock().unwrap().clone() {
            return Err(error);
        }

        let product = self.products.lock().unwrap().get(id).cloned().ok_or_else(|| {
            StoreError::new(StoreErrorCode::StoreProductNotAvailable, id.clone())
        })?;

        Ok(PurchaseDetails {
            product,
            quantity: 1,
            transaction_identifier: Some(uuid::Uuid::new_v4().to_string()),
        })
    }

    async fn complete_transactions(&self) -> Vec<PendingPurchase> {
        self.complete_calls.fetch_add(1, Ordering::SeqCst);
        std::mem::take(&mut *self.pending.lock().unwrap())
    }
}

/// Validator double returning a scripted receipt
#[derive(Default)]
pub struct FakeValidator {
    receipt: Mutex<Option<Receipt>>,
    calls: AtomicUsize,
}

impl FakeValidator {
    pub fn with_receipt(receipt: Receipt) -> Self {
        Self {
            receipt: Mutex::new(Some(receipt)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReceiptValidator for FakeValidator {
    async fn verify_receipt(&self) -> Result<Receipt, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.receipt
            .lock()
            .unwrap()
            .clone()
            .ok_or(VerifyError::NoReceiptData)
    }
}

pub async fn service(storefront: FakeStorefront, validator: FakeValidator) -> TestService {
    PurchasesService::new(storefront, validator, MemoryStorage::new(), STATE_KEY)
        .await
        .expect("Failed to create service")
}

pub fn lifetime_product(id: &str) -> StoreProduct {
    StoreProduct {
        product_identifier: id.to_string(),
        price_micros: 19_990_000,
        currency_code: "USD".to_string(),
        price_locale: "en_US".to_string(),
        subscription_period: None,
        introductory_period: None,
    }
}

pub fn monthly_product(id: &str) -> StoreProduct {
    StoreProduct {
        subscription_period: Some(SubscriptionPeriod::new(PeriodUnit::Month, 1)),
        introductory_period: Some(SubscriptionPeriod::new(PeriodUnit::Week, 1)),
        price_micros: 4_990_000,
        ..lifetime_product(id)
    }
}

pub fn receipt_entry(product_id: &str, expires_in_days: Option<i64>) -> ReceiptEntry {
    let now = OffsetDateTime::now_utc();
    ReceiptEntry {
        product_id: product_id.to_string(),
        transaction_id: Some(uuid::Uuid::new_v4().to_string()),
        original_transaction_id: None,
        purchase_date: Some(now - Duration::days(45)),
        expires_date: expires_in_days.map(|days| now + Duration::days(days)),
        cancellation_date: None,
    }
}
