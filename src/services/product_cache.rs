use crate::models::{Product, ProductId};
use std::{collections::HashMap, sync::Mutex};

/// In-memory cache of the last fetched metadata per product
#[derive(Debug, Default)]
pub struct ProductCache {
    products: Mutex<HashMap<ProductId, Product>>,
}

/// Split of a lookup into cached hits and ids that still need fetching
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CacheLookup {
    pub cached: Vec<Product>,
    pub missing: Vec<ProductId>,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up ids in request order; duplicates are resolved once
    pub fn lookup(&self, ids: &[ProductId]) -> CacheLookup {
        let products = self
            .products
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut lookup = CacheLookup::default();
        for id in ids {
            if lookup.missing.contains(id) || lookup.cached.iter().any(|p| &p.id == id) {
                continue;
            }
            match products.get(id) {
                Some(product) => lookup.cached.push(product.clone()),
                None => lookup.missing.push(id.clone()),
            }
        }
        lookup
    }

    pub fn get(&self, id: &str) -> Option<Product> {
        self.products
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(id)
            .cloned()
    }

    /// Insert fetched products; the latest fetch wins
    pub fn insert_all<'a>(&self, fetched: impl IntoIterator<Item = &'a Product>) {
        let mut products = self
            .products
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        for product in fetched {
            products.insert(product.id.clone(), product.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.products.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
