use crate::models::{Product, PurchaseStatus, Receipt, ReceiptEntry};
use time::OffsetDateTime;

/// Compute the entitlement of `product` from a decoded receipt.
///
/// Lifetime products are checked for any purchase record in `in_app`,
/// subscriptions by their latest expiry.
pub fn verify_product(product: &Product, receipt: &Receipt, now: OffsetDateTime) -> PurchaseStatus {
    if product.period.is_subscription() {
        verify_subscription(&product.id, receipt, now)
    } else {
        verify_purchase(&product.id, receipt)
    }
}

/// Non-consumable check: purchased iff a non-cancelled `in_app` record exists.
///
/// `latest_receipt_info` only carries auto-renewable transactions, so it is
/// never consulted here.
pub fn verify_purchase(product_id: &str, receipt: &Receipt) -> PurchaseStatus {
    let purchased = active(product_id, &receipt.receipt.in_app).next().is_some();

    if purchased {
        PurchaseStatus::Purchased
    } else {
        PurchaseStatus::NotPurchased
    }
}

/// Auto-renewable subscription check against the latest expiry date
pub fn verify_subscription(
    product_id: &str,
    receipt: &Receipt,
    now: OffsetDateTime,
) -> PurchaseStatus {
    let latest_expiry = active(product_id, receipt.entries())
        .filter_map(|entry| entry.expires_date)
        .max();

    match latest_expiry {
        None => PurchaseStatus::NotPurchased,
        Some(expires) if expires > now => PurchaseStatus::Purchased,
        Some(_) => PurchaseStatus::Expired,
    }
}

fn active<'a>(
    product_id: &'a str,
    entries: &'a [ReceiptEntry],
) -> impl Iterator<Item = &'a ReceiptEntry> {
    entries
        .iter()
        .filter(move |entry| entry.product_id == product_id && !entry.is_cancelled())
}
