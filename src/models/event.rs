use super::{product::ProductId, state::PurchaseState, transaction::Transaction};

/// Notifications delivered to subscribers of a purchases client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PurchasesEvent {
    /// The persisted state was updated; carries the full merged state
    DidChangeState(PurchaseState),
    DidPurchaseProduct(Transaction),
    DidRestoreProducts(Vec<ProductId>),
    /// Pending transactions were drained during setup
    DidProceedProducts(Vec<ProductId>),
}
