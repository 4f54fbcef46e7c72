/// Error codes reported by the platform store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    Unknown,
    ClientInvalid,
    PaymentCancelled,
    PaymentInvalid,
    PaymentNotAllowed,
    StoreProductNotAvailable,
    CloudServicePermissionDenied,
    CloudServiceNetworkConnectionFailed,
    CloudServiceRevoked,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Store error ({code:?}): {message}")]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Failure of `purchase_product`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PurchaseError {
    #[error("Purchase failed for an unknown reason")]
    Unknown,

    #[error("Network connection failed")]
    NetworkConnectionFailed,

    #[error("Purchase was cancelled")]
    Cancelled,
}

impl From<&StoreError> for PurchaseError {
    fn from(error: &StoreError) -> Self {
        match error.code {
            StoreErrorCode::CloudServiceNetworkConnectionFailed => Self::NetworkConnectionFailed,
            StoreErrorCode::PaymentCancelled => Self::Cancelled,
            _ => Self::Unknown,
        }
    }
}

/// Failure of `restore_purchases`
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RestoreError {
    #[error("Restore failed for an unknown reason")]
    Unknown,

    #[error("Nothing to restore")]
    NothingToRestore,

    #[error("Failed to restore purchases")]
    FailedToRestore,
}

/// Failure of `load_products`; only raised when nothing could be resolved
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadProductsError {
    #[error("Failed to retrieve products: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid stored value for key {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    #[error("No receipt data available")]
    NoReceiptData,

    #[error("Failed to read receipt: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to verify receipt: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid receipt status: {0}")]
    InvalidStatus(i32),

    #[error("Invalid response format: {0}")]
    MalformedResponse(String),
}
