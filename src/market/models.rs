use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{FromRow, Row};

use super::currency::Currency;
use super::{MarketError, MarketResult};
use crate::config::MARKET_DEFAULT_LOCALE;

/// Largest amount a decimal(5,2) column holds.
fn max_amount() -> Decimal {
    Decimal::new(99_999, 2)
}

/// key: market-amount-validation -> decimal(5,2), non-negative
pub fn validate_amount(amount: Decimal) -> MarketResult<Decimal> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MarketError::InvalidAmount {
            amount,
            reason: "must not be negative",
        });
    }
    if amount.normalize().scale() > 2 {
        return Err(MarketError::InvalidAmount {
            amount,
            reason: "at most two decimal places are allowed",
        });
    }
    if amount > max_amount() {
        return Err(MarketError::InvalidAmount {
            amount,
            reason: "exceeds five significant digits",
        });
    }
    Ok(money_scale(amount.abs()))
}

/// Brings a NUMERIC value back to the decimal(5,2) scale; the driver may hand
/// it over with extra trailing zeros.
pub fn money_scale(mut amount: Decimal) -> Decimal {
    amount.rescale(2);
    amount
}

fn money_column(row: &PgRow, column: &str) -> Result<Decimal, sqlx::Error> {
    row.try_get::<Decimal, _>(column).map(money_scale)
}

/// Display strings keyed by locale (`en-US`, `de`, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocalizedName(BTreeMap<String, String>);

impl LocalizedName {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locale: impl Into<String>, text: impl Into<String>) -> Self {
        self.0.insert(locale.into(), text.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Resolves `locale`, then `fallback_locale`, then whatever translation sorts first.
    pub fn resolve(&self, locale: &str, fallback_locale: &str) -> Option<&str> {
        self.0
            .get(locale)
            .or_else(|| self.0.get(fallback_locale))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
    }

    pub fn localized(&self, locale: Option<&str>) -> &str {
        let fallback = MARKET_DEFAULT_LOCALE.as_str();
        self.resolve(locale.unwrap_or(fallback), fallback)
            .unwrap_or_default()
    }
}

/// key: market-models -> price tiers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Price {
    pub id: i64,
    pub active: bool,
    pub name: LocalizedName,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Price {
    /// Currency `price` is expressed in.
    pub const REFERENCE_CURRENCY: &'static str = "USD";
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name.localized(None), self.price)
    }
}

impl<'r> FromRow<'r, PgRow> for Price {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let name: Json<LocalizedName> = row.try_get("name")?;
        Ok(Self {
            id: row.try_get("id")?,
            active: row.try_get("active")?,
            name: name.0,
            price: money_column(row, "price")?,
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPrice {
    pub name: LocalizedName,
    pub price: Decimal,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// key: market-models -> per-currency tier override
#[derive(Debug, Clone, Serialize)]
pub struct PriceCurrency {
    pub id: i64,
    pub currency: Currency,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub tier_id: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl PriceCurrency {
    /// Human readable form; the tier is passed in since rows only carry its id.
    pub fn describe(&self, tier: &Price) -> String {
        format!(
            "{}, {}: {}",
            tier.name.localized(None),
            self.currency,
            self.price
        )
    }
}

impl<'r> FromRow<'r, PgRow> for PriceCurrency {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let code: String = row.try_get("currency")?;
        let currency = Currency::from_code(&code).ok_or_else(|| sqlx::Error::ColumnDecode {
            index: "currency".to_string(),
            source: Box::new(MarketError::UnsupportedCurrency(code.clone())),
        })?;
        Ok(Self {
            id: row.try_get("id")?,
            currency,
            price: money_column(row, "price")?,
            tier_id: row.try_get("tier_id")?,
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

/// key: market-models -> entitlement row; one per recorded purchase
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct AddonPurchase {
    pub id: i64,
    pub addon_id: i64,
    pub user_id: i64,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl fmt::Display for AddonPurchase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.addon_id, self.user_id)
    }
}
