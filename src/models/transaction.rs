use serde::{Deserialize, Serialize};

use super::product::{Product, ProductId};

/// Result of a successful store purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub product: Product,
    pub quantity: Option<u32>,
    pub transaction_identifier: Option<String>,
}

impl Transaction {
    pub fn product_id(&self) -> &ProductId {
        &self.product.id
    }
}
