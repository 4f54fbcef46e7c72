// Service modules
pub mod events;
pub mod product_cache;
pub mod purchases_service;
pub mod receipt_validator;
pub mod state_store;
pub mod storage;
pub mod storefront;
pub mod verification;

pub use events::{EventPublisher, EventSubscription};
pub use purchases_service::PurchasesService;
pub use receipt_validator::{AppleReceiptValidator, ReceiptValidator};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
pub use storefront::{OfflineStorefront, Storefront};
