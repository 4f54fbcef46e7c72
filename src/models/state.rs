use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::product::ProductId;

/// Entitlement status of a single product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PurchaseStatus {
    Purchased,
    NotPurchased,
    Expired,
}

/// Persisted entitlement map, product id -> status.
///
/// Updates are merged key by key; entries are never removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseState(BTreeMap<ProductId, PurchaseStatus>);

impl PurchaseState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge entries into the map; later entries win for the same key
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (ProductId, PurchaseStatus)>,
    {
        self.0.extend(entries);
    }

    pub fn status(&self, id: &str) -> Option<PurchaseStatus> {
        self.0.get(id).copied()
    }

    pub fn is_purchased(&self, id: &str) -> bool {
        self.status(id) == Some(PurchaseStatus::Purchased)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, &PurchaseStatus)> {
        self.0.iter()
    }
}

impl FromIterator<(ProductId, PurchaseStatus)> for PurchaseState {
    fn from_iter<I: IntoIterator<Item = (ProductId, PurchaseStatus)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
