use serde::Deserialize;
use std::path::PathBuf;
use validator::Validate;

use crate::models::{Discount, Price, Product, PurchasePeriod};

/// Key under which the purchase state record is persisted
pub const DEFAULT_STATE_KEY: &str = "com.pocket-ninja.purchases.swifty.purchases-state";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub store: StoreConfig,
    #[validate(nested)]
    pub storage: StorageConfig,
    #[serde(default)]
    #[validate(nested)]
    pub catalog: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptEnvironment {
    Production,
    Sandbox,
}

impl ReceiptEnvironment {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Production => "https://buy.itunes.apple.com/verifyReceipt",
            Self::Sandbox => "https://sandbox.itunes.apple.com/verifyReceipt",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StoreConfig {
    #[validate(length(min = 1))]
    pub shared_secret: String,
    pub environment: ReceiptEnvironment,
    pub receipt_path: PathBuf,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default = "default_exclude_old_transactions")]
    pub exclude_old_transactions: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct StorageConfig {
    pub path: PathBuf,
    #[serde(default = "default_state_key")]
    #[validate(length(min = 1))]
    pub state_key: String,
}

/// Product metadata served by the offline storefront
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CatalogProduct {
    #[validate(length(min = 1, max = 255))]
    pub id: String,
    pub period: PurchasePeriod,
    pub price_micros: i64,
    #[validate(length(equal = 3))]
    pub currency_code: String,
    pub locale: String,
    #[serde(default)]
    pub trial_days: Option<u32>,
}

impl From<&CatalogProduct> for Product {
    fn from(entry: &CatalogProduct) -> Self {
        let product = Product::new(
            entry.id.clone(),
            entry.period,
            Price::new(
                entry.price_micros,
                entry.currency_code.clone(),
                entry.locale.clone(),
            ),
        );

        match entry.trial_days {
            Some(trial_days) => product.with_discount(Discount { trial_days }),
            None => product,
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    15_000
}

fn default_exclude_old_transactions() -> bool {
    true
}

fn default_state_key() -> String {
    DEFAULT_STATE_KEY.to_string()
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("purchases").required(true))
            .add_source(
                config::Environment::with_prefix("PURCHASES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::from_source(config)
    }

    /// Deserialize and validate an already assembled configuration
    pub fn from_source(source: config::Config) -> Result<Self, config::ConfigError> {
        let config: Self = source.try_deserialize()?;
        config
            .validate()
            .map_err(|e| config::ConfigError::Message(format!("Validation error: {}", e)))?;
        Ok(config)
    }
}
