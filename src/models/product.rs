use serde::{Deserialize, Serialize};

/// Store product identifier
pub type ProductId = String;

/// Billing period of a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchasePeriod {
    Week,
    Month,
    Year,
    Lifetime,
}

impl PurchasePeriod {
    pub fn is_subscription(&self) -> bool {
        !matches!(self, Self::Lifetime)
    }
}

/// Calendar unit used by storefront subscription periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodUnit {
    Day,
    Week,
    Month,
    Year,
}

impl PeriodUnit {
    /// Approximate length of one unit in days
    pub fn estimated_days(&self) -> u32 {
        match self {
            Self::Day => 1,
            Self::Week => 7,
            Self::Month => 30,
            Self::Year => 365,
        }
    }
}

/// Subscription period as reported by the storefront, e.g. 3 months
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionPeriod {
    pub unit: PeriodUnit,
    pub number_of_units: u32,
}

impl SubscriptionPeriod {
    pub fn new(unit: PeriodUnit, number_of_units: u32) -> Self {
        Self {
            unit,
            number_of_units,
        }
    }

    pub fn days(&self) -> u32 {
        self.number_of_units.saturating_mul(self.unit.estimated_days())
    }
}

/// Raw product record returned by a storefront lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreProduct {
    pub product_identifier: ProductId,
    pub price_micros: i64,
    pub currency_code: String,
    pub price_locale: String,
    pub subscription_period: Option<SubscriptionPeriod>,
    pub introductory_period: Option<SubscriptionPeriod>,
}

/// Localized price of a product
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Price {
    /// Amount in millionths of the currency unit
    pub amount_micros: i64,
    pub currency_code: String,
    pub locale: String,
}

impl Price {
    pub fn new(
        amount_micros: i64,
        currency_code: impl Into<String>,
        locale: impl Into<String>,
    ) -> Self {
        Self {
            amount_micros,
            currency_code: currency_code.into(),
            locale: locale.into(),
        }
    }

    /// Render the amount with two fraction digits, e.g. `USD 4.99`
    pub fn formatted(&self) -> String {
        let cents = self
            .amount_micros
            .saturating_add(self.amount_micros.signum() * 5_000)
            / 10_000;
        let sign = if cents < 0 { "-" } else { "" };
        let cents = cents.abs();
        format!(
            "{} {}{}.{:02}",
            self.currency_code,
            sign,
            cents / 100,
            cents % 100
        )
    }
}

/// Introductory offer attached to a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discount {
    pub trial_days: u32,
}

/// Snapshot of product metadata as fetched from the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub period: PurchasePeriod,
    pub price: Price,
    pub discount: Option<Discount>,
}

impl Product {
    pub fn new(id: impl Into<ProductId>, period: PurchasePeriod, price: Price) -> Self {
        Self {
            id: id.into(),
            period,
            price,
            discount: None,
        }
    }

    pub fn with_discount(mut self, discount: Discount) -> Self {
        self.discount = Some(discount);
        self
    }
}

impl From<StoreProduct> for Product {
    fn from(product: StoreProduct) -> Self {
        let period = match product.subscription_period.map(|p| p.unit) {
            None => PurchasePeriod::Lifetime,
            Some(PeriodUnit::Month) => PurchasePeriod::Month,
            Some(PeriodUnit::Year) => PurchasePeriod::Year,
            Some(_) => PurchasePeriod::Week,
        };

        let discount = product.introductory_period.map(|intro| Discount {
            trial_days: intro.days(),
        });

        Self {
            id: product.product_identifier,
            period,
            price: Price {
                amount_micros: product.price_micros,
                currency_code: product.currency_code,
                locale: product.price_locale,
            },
            discount,
        }
    }
}
