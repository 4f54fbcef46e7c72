// Library exports for embedding and testing
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod lifecycle;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use client::PurchasesClient;
pub use config::Config;
pub use context::PurchasesContext;
pub use error::{LoadProductsError, PurchaseError, RestoreError, StoreError, StoreErrorCode};
pub use lifecycle::AppLifecycleEvent;
pub use models::{Product, ProductId, PurchaseState, PurchaseStatus, PurchasesEvent, Transaction};
