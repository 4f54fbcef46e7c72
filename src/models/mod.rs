// Domain models
pub mod event;
pub mod product;
pub mod receipt;
pub mod state;
pub mod transaction;

pub use event::PurchasesEvent;
pub use product::{
    Discount, PeriodUnit, Price, Product, ProductId, PurchasePeriod, StoreProduct,
    SubscriptionPeriod,
};
pub use receipt::{Receipt, ReceiptEntry};
pub use state::{PurchaseState, PurchaseStatus};
pub use transaction::Transaction;
