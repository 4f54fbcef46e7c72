use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use time::OffsetDateTime;

use super::product::ProductId;

/// Raw response of the App Store `verifyReceipt` endpoint
#[derive(Debug, Deserialize)]
pub struct VerifyReceiptResponse {
    pub status: i32,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub receipt: Option<ReceiptBody>,
    #[serde(default)]
    pub latest_receipt_info: Option<Vec<ReceiptEntry>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptBody {
    #[serde(default)]
    pub bundle_id: Option<String>,
    #[serde(default)]
    pub in_app: Vec<ReceiptEntry>,
}

/// A single in-app purchase record inside a receipt.
///
/// Dates arrive as millisecond timestamps encoded as strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptEntry {
    pub product_id: ProductId,
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub original_transaction_id: Option<String>,
    #[serde(
        default,
        rename = "purchase_date_ms",
        deserialize_with = "millis",
        serialize_with = "to_millis"
    )]
    pub purchase_date: Option<OffsetDateTime>,
    #[serde(
        default,
        rename = "expires_date_ms",
        deserialize_with = "millis",
        serialize_with = "to_millis"
    )]
    pub expires_date: Option<OffsetDateTime>,
    #[serde(
        default,
        rename = "cancellation_date_ms",
        deserialize_with = "millis",
        serialize_with = "to_millis"
    )]
    pub cancellation_date: Option<OffsetDateTime>,
}

impl ReceiptEntry {
    pub fn is_cancelled(&self) -> bool {
        self.cancellation_date.is_some()
    }
}

/// Decoded receipt used to recompute entitlements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default)]
    pub receipt: ReceiptBody,
    #[serde(default)]
    pub latest_receipt_info: Option<Vec<ReceiptEntry>>,
}

impl Receipt {
    pub fn new(in_app: Vec<ReceiptEntry>, latest_receipt_info: Option<Vec<ReceiptEntry>>) -> Self {
        Self {
            receipt: ReceiptBody {
                bundle_id: None,
                in_app,
            },
            latest_receipt_info,
        }
    }

    /// Entries that describe the current purchase history.
    ///
    /// `latest_receipt_info` supersedes `in_app` when the endpoint returns it.
    pub fn entries(&self) -> &[ReceiptEntry] {
        match &self.latest_receipt_info {
            Some(latest) => latest,
            None => &self.receipt.in_app,
        }
    }

    /// Distinct product ids found anywhere in the receipt, `None` when empty
    pub fn distinct_product_ids(&self) -> Option<BTreeSet<ProductId>> {
        let ids: BTreeSet<ProductId> = self
            .receipt
            .in_app
            .iter()
            .chain(self.latest_receipt_info.iter().flatten())
            .map(|entry| entry.product_id.clone())
            .collect();

        if ids.is_empty() {
            None
        } else {
            Some(ids)
        }
    }
}

impl From<VerifyReceiptResponse> for Receipt {
    fn from(response: VerifyReceiptResponse) -> Self {
        Self {
            receipt: response.receipt.unwrap_or_default(),
            latest_receipt_info: response.latest_receipt_info,
        }
    }
}

fn millis<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let ms = raw.parse::<i64>().map_err(serde::de::Error::custom)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000)
        .map(Some)
        .map_err(serde::de::Error::custom)
}

fn to_millis<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        Some(date) => {
            let ms = date.unix_timestamp_nanos() / 1_000_000;
            serializer.serialize_some(&ms.to_string())
        }
        None => serializer.serialize_none(),
    }
}
