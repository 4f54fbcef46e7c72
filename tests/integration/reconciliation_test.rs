use crate::common::{
    lifetime_product, monthly_product, receipt_entry, service, FakeStorefront, FakeValidator,
};
use pocket_purchases::{
    models::Receipt,
    services::storefront::{PendingPurchase, TransactionState},
    PurchaseStatus, PurchasesClient, PurchasesEvent,
};

fn pending(product_id: &str, transaction_state: TransactionState) -> PendingPurchase {
    PendingPurchase {
        product_id: product_id.to_string(),
        quantity: 1,
        transaction_state,
    }
}

#[tokio::test]
async fn test_setup_drains_completed_transactions() {
    let storefront = FakeStorefront::default();
    storefront.set_pending(vec![
        pending("purchased", TransactionState::Purchased),
        pending("restored", TransactionState::Restored),
        pending("failed", TransactionState::Failed),
        pending("deferred", TransactionState::Deferred),
    ]);
    let service = service(storefront, FakeValidator::default()).await;
    let mut events = service.subscribe();

    service.setup().await;

    let state = service.state();
    assert_eq!(state.len(), 2);
    assert!(state.is_purchased("purchased"));
    assert!(state.is_purchased("restored"));
    assert_eq!(state.status("failed"), None);

    // State change is published before the drain notification
    assert_eq!(
        events.drain(),
        vec![
            PurchasesEvent::DidChangeState(state),
            PurchasesEvent::DidProceedProducts(vec![
                "purchased".to_string(),
                "restored".to_string()
            ]),
        ]
    );
}

#[tokio::test]
async fn test_setup_with_nothing_pending_still_reports_drain() {
    let service = service(FakeStorefront::default(), FakeValidator::default()).await;
    let mut events = service.subscribe();

    service.setup().await;

    assert!(service.state().is_empty());
    assert!(events
        .drain()
        .contains(&PurchasesEvent::DidProceedProducts(vec![])));
}

#[tokio::test]
async fn test_verification_merges_receipt_statuses() {
    let storefront = FakeStorefront::with_products([
        lifetime_product("lifetime"),
        monthly_product("monthly"),
        monthly_product("unrelated"),
    ]);
    storefront.set_pending(vec![pending("unrelated", TransactionState::Purchased)]);

    // latest_receipt_info carries subscriptions only; the lifetime record is in in_app
    let receipt = Receipt::new(
        vec![receipt_entry("lifetime", None)],
        Some(vec![receipt_entry("monthly", Some(-3))]),
    );
    let service = service(storefront, FakeValidator::with_receipt(receipt)).await;

    service.setup().await;

    let state = service.state();
    assert_eq!(state.status("lifetime"), Some(PurchaseStatus::Purchased));
    assert_eq!(state.status("monthly"), Some(PurchaseStatus::Expired));
    // Products absent from the receipt are left untouched
    assert_eq!(state.status("unrelated"), Some(PurchaseStatus::Purchased));
    assert_eq!(state.len(), 3);

    // Only receipt products were looked up
    let requested = service.storefront().requested();
    assert_eq!(requested.len(), 1);
    assert_eq!(
        requested[0].iter().cloned().collect::<Vec<_>>(),
        vec!["lifetime".to_string(), "monthly".to_string()]
    );
}

#[tokio::test]
async fn test_verification_downgrades_purchased_subscription() {
    let storefront = FakeStorefront::with_products([monthly_product("monthly")]);
    storefront.set_pending(vec![pending("monthly", TransactionState::Purchased)]);

    // Receipt lists the subscription without an active period
    let receipt = Receipt::new(vec![], Some(vec![receipt_entry("monthly", Some(-1))]));
    let service = service(storefront, FakeValidator::with_receipt(receipt)).await;

    service.setup().await;

    assert_eq!(
        service.state().status("monthly"),
        Some(PurchaseStatus::Expired)
    );
}

#[tokio::test]
async fn test_verification_failure_leaves_state_untouched() {
    let storefront = FakeStorefront::with_products([monthly_product("monthly")]);
    storefront.set_pending(vec![pending("monthly", TransactionState::Purchased)]);
    let service = service(storefront, FakeValidator::default()).await;

    service.setup().await;

    assert_eq!(service.validator().calls(), 1);
    assert!(service.state().is_purchased("monthly"));
}

#[tokio::test]
async fn test_foreground_runs_one_verification_without_drain() {
    let storefront = FakeStorefront::with_products([monthly_product("monthly")]);
    let receipt = Receipt::new(vec![], Some(vec![receipt_entry("monthly", Some(30))]));
    let service = service(storefront, FakeValidator::with_receipt(receipt)).await;

    service.setup().await;
    assert_eq!(service.storefront().complete_calls(), 1);
    assert_eq!(service.validator().calls(), 1);

    service.will_enter_foreground().await;

    assert_eq!(service.storefront().complete_calls(), 1);
    assert_eq!(service.validator().calls(), 2);
    assert!(service.state().is_purchased("monthly"));

    // Product metadata is served from cache on re-verification
    assert_eq!(service.storefront().retrieve_calls(), 1);
}
