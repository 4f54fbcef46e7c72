use crate::{
    config::{ReceiptEnvironment, StoreConfig},
    error::VerifyError,
    models::{receipt::VerifyReceiptResponse, Receipt},
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::{Digest, Sha256};
use std::{path::PathBuf, time::Duration};
use tracing::{info, instrument, warn};

/// Status returned by the production endpoint for a sandbox receipt
const SANDBOX_RECEIPT_IN_PRODUCTION: i32 = 21007;

/// Validates the app receipt and returns its decoded contents
#[async_trait]
pub trait ReceiptValidator: Send + Sync {
    async fn verify_receipt(&self) -> Result<Receipt, VerifyError>;
}

/// Validator backed by the App Store `verifyReceipt` endpoint
pub struct AppleReceiptValidator {
    shared_secret: String,
    environment: ReceiptEnvironment,
    receipt_path: PathBuf,
    exclude_old_transactions: bool,
    http_client: reqwest::Client,
}

impl AppleReceiptValidator {
    pub fn new(config: &StoreConfig) -> Result<Self, VerifyError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self {
            shared_secret: config.shared_secret.clone(),
            environment: config.environment,
            receipt_path: config.receipt_path.clone(),
            exclude_old_transactions: config.exclude_old_transactions,
            http_client,
        })
    }

    async fn read_receipt(&self) -> Result<String, VerifyError> {
        let bytes = match tokio::fs::read(&self.receipt_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VerifyError::NoReceiptData)
            }
            Err(e) => return Err(e.into()),
        };

        if bytes.is_empty() {
            return Err(VerifyError::NoReceiptData);
        }

        Ok(STANDARD.encode(bytes))
    }

    async fn post_receipt(
        &self,
        environment: ReceiptEnvironment,
        receipt: &str,
    ) -> Result<VerifyReceiptResponse, VerifyError> {
        let request_body = serde_json::json!({
            "receipt-data": receipt,
            "password": self.shared_secret,
            "exclude-old-transactions": self.exclude_old_transactions,
        });

        let response = self
            .http_client
            .post(environment.endpoint())
            .json(&request_body)
            .send()
            .await?;

        response
            .json()
            .await
            .map_err(|e| VerifyError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl ReceiptValidator for AppleReceiptValidator {
    #[instrument(skip(self))]
    async fn verify_receipt(&self) -> Result<Receipt, VerifyError> {
        let receipt = self.read_receipt().await?;
        let fingerprint = receipt_fingerprint(&receipt);

        let mut response = self.post_receipt(self.environment, &receipt).await?;

        // Sandbox receipts sent to production are retried once against sandbox
        if response.status == SANDBOX_RECEIPT_IN_PRODUCTION
            && self.environment == ReceiptEnvironment::Production
        {
            warn!(
                "Receipt {} belongs to sandbox, retrying verification",
                fingerprint
            );
            response = self
                .post_receipt(ReceiptEnvironment::Sandbox, &receipt)
                .await?;
        }

        if response.status != 0 {
            return Err(VerifyError::InvalidStatus(response.status));
        }

        let receipt = Receipt::from(response);

        info!(
            "Verified receipt {}: {} entries",
            fingerprint,
            receipt.entries().len()
        );

        Ok(receipt)
    }
}

/// SHA-256 of the encoded receipt, used to identify receipts in logs
pub fn receipt_fingerprint(receipt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(receipt.as_bytes());
    format!("{:x}", hasher.finalize())
}
