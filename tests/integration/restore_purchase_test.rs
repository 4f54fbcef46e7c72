use crate::common::{monthly_product, service, FakeStorefront, FakeValidator};
use pocket_purchases::{
    services::storefront::{RestoreResults, RestoredPurchase},
    PurchaseError, PurchaseStatus, PurchasesClient, PurchasesEvent, RestoreError, StoreError,
    StoreErrorCode,
};

fn restored(ids: &[&str]) -> RestoreResults {
    RestoreResults {
        restored_purchases: ids
            .iter()
            .map(|id| RestoredPurchase {
                product_id: id.to_string(),
                transaction_identifier: None,
            })
            .collect(),
        restore_failed_purchases: vec![],
    }
}

#[tokio::test]
async fn test_restore_with_nothing_restored() {
    let service = service(FakeStorefront::default(), FakeValidator::default()).await;
    let mut events = service.subscribe();

    let result = service.restore_purchases().await;

    assert_eq!(result, Err(RestoreError::NothingToRestore));
    assert!(events.drain().is_empty());
}

#[tokio::test]
async fn test_restore_with_failures_only() {
    let storefront = FakeStorefront::default();
    storefront.set_restore_result(Ok(RestoreResults {
        restored_purchases: vec![],
        restore_failed_purchases: vec![(
            StoreError::new(StoreErrorCode::Unknown, "receipt unavailable"),
            Some("monthly".to_string()),
        )],
    }));
    let service = service(storefront, FakeValidator::default()).await;

    assert_eq!(
        service.restore_purchases().await,
        Err(RestoreError::FailedToRestore)
    );
    assert!(service.state().is_empty());
}

#[tokio::test]
async fn test_restore_request_failure_is_unknown() {
    let storefront = FakeStorefront::default();
    storefront.set_restore_result(Err(StoreError::new(
        StoreErrorCode::ClientInvalid,
        "not allowed",
    )));
    let service = service(storefront, FakeValidator::default()).await;

    assert_eq!(service.restore_purchases().await, Err(RestoreError::Unknown));
}

#[tokio::test]
async fn test_restore_merges_without_removing_entries() {
    let storefront = FakeStorefront::with_products([monthly_product("existing")]);
    storefront.set_restore_result(Ok(restored(&["a", "b", "a"])));
    let service = service(storefront, FakeValidator::default()).await;

    service.purchase_product(&"existing".to_string()).await.unwrap();
    let mut events = service.subscribe();

    let ids = service.restore_purchases().await.unwrap();

    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

    let state = service.state();
    assert_eq!(state.len(), 3);
    assert!(state.is_purchased("existing"));
    assert!(state.is_purchased("a"));
    assert!(state.is_purchased("b"));

    assert_eq!(
        events.drain(),
        vec![
            PurchasesEvent::DidChangeState(state),
            PurchasesEvent::DidRestoreProducts(ids),
        ]
    );
}

#[tokio::test]
async fn test_purchase_marks_product_purchased() {
    let storefront = FakeStorefront::with_products([monthly_product("monthly")]);
    let service = service(storefront, FakeValidator::default()).await;
    let mut events = service.subscribe();

    let transaction = service
        .purchase_product(&"monthly".to_string())
        .await
        .unwrap();

    assert_eq!(transaction.product_id(), "monthly");
    assert_eq!(transaction.quantity, Some(1));
    assert!(transaction.transaction_identifier.is_some());
    assert_eq!(
        service.state().status("monthly"),
        Some(PurchaseStatus::Purchased)
    );

    assert_eq!(
        events.drain(),
        vec![
            PurchasesEvent::DidChangeState(service.state()),
            PurchasesEvent::DidPurchaseProduct(transaction),
        ]
    );
}

#[tokio::test]
async fn test_purchase_error_mapping() {
    let cases = [
        (StoreErrorCode::PaymentCancelled, PurchaseError::Cancelled),
        (
            StoreErrorCode::CloudServiceNetworkConnectionFailed,
            PurchaseError::NetworkConnectionFailed,
        ),
        (StoreErrorCode::PaymentNotAllowed, PurchaseError::Unknown),
    ];

    for (code, expected) in cases {
        let storefront = FakeStorefront::with_products([monthly_product("monthly")]);
        storefront.fail_purchase(code);
        let service = service(storefront, FakeValidator::default()).await;
        let mut events = service.subscribe();

        let result = service.purchase_product(&"monthly".to_string()).await;

        assert_eq!(result, Err(expected));
        assert!(service.state().is_empty());
        assert!(events.drain().is_empty());
    }
}
