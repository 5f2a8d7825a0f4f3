use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use super::currency::Currency;
use super::models::{validate_amount, NewPrice, Price, PriceCurrency};
use super::{MarketError, MarketResult};

const PRICE_COLUMNS: &str = "id, active, name, price, created, modified";
const PRICE_CURRENCY_COLUMNS: &str = "id, currency, price, tier_id, created, modified";

/// key: market-prices -> tier catalogue + currency overrides
#[derive(Clone)]
pub struct PriceService {
    pool: PgPool,
}

impl PriceService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_active_tiers(&self) -> MarketResult<Vec<Price>> {
        let tiers = sqlx::query_as::<_, Price>(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices WHERE active = TRUE ORDER BY price ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }

    pub async fn list_tiers(&self) -> MarketResult<Vec<Price>> {
        let tiers = sqlx::query_as::<_, Price>(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices ORDER BY price ASC, id ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(tiers)
    }

    pub async fn get_tier(&self, tier_id: i64) -> MarketResult<Price> {
        sqlx::query_as::<_, Price>(&format!(
            "SELECT {PRICE_COLUMNS} FROM prices WHERE id = $1"
        ))
        .bind(tier_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(MarketError::NotFound {
            entity: "price",
            id: tier_id,
        })
    }

    pub async fn create_tier(&self, new: NewPrice) -> MarketResult<Price> {
        let amount = validate_amount(new.price)?;
        let tier = sqlx::query_as::<_, Price>(&format!(
            "INSERT INTO prices (active, name, price) VALUES ($1, $2, $3) RETURNING {PRICE_COLUMNS}"
        ))
        .bind(new.active)
        .bind(Json(&new.name))
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        info!(tier = tier.id, price = %tier.price, active = tier.active, "price tier created");
        Ok(tier)
    }

    /// Soft-disables (or re-enables) a tier.
    pub async fn set_tier_active(&self, tier_id: i64, active: bool) -> MarketResult<Price> {
        let tier = sqlx::query_as::<_, Price>(&format!(
            "UPDATE prices SET active = $2, modified = NOW() WHERE id = $1 RETURNING {PRICE_COLUMNS}"
        ))
        .bind(tier_id)
        .bind(active)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(MarketError::NotFound {
            entity: "price",
            id: tier_id,
        })?;

        info!(tier = tier.id, active, "price tier availability changed");
        Ok(tier)
    }

    /// Removes a tier along with its currency rows.
    pub async fn delete_tier(&self, tier_id: i64) -> MarketResult<()> {
        let result = sqlx::query("DELETE FROM prices WHERE id = $1")
            .bind(tier_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::NotFound {
                entity: "price",
                id: tier_id,
            });
        }
        info!(tier = tier_id, "price tier deleted");
        Ok(())
    }

    pub async fn tier_currencies(&self, tier_id: i64) -> MarketResult<Vec<PriceCurrency>> {
        let rows = sqlx::query_as::<_, PriceCurrency>(&format!(
            "SELECT {PRICE_CURRENCY_COLUMNS} FROM price_currency WHERE tier_id = $1 ORDER BY currency, id"
        ))
        .bind(tier_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Override for `currency` on the tier. Duplicate rows are possible; the
    /// oldest one wins.
    pub async fn currency_price(
        &self,
        tier_id: i64,
        currency: Currency,
    ) -> MarketResult<Option<PriceCurrency>> {
        let row = sqlx::query_as::<_, PriceCurrency>(&format!(
            "SELECT {PRICE_CURRENCY_COLUMNS} FROM price_currency WHERE tier_id = $1 AND currency = $2 ORDER BY id LIMIT 1"
        ))
        .bind(tier_id)
        .bind(currency.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn add_currency_price(
        &self,
        tier_id: i64,
        currency: Currency,
        amount: Decimal,
    ) -> MarketResult<PriceCurrency> {
        let amount = validate_amount(amount)?;
        // Surface a typed error instead of a foreign key violation.
        self.get_tier(tier_id).await?;

        let row = sqlx::query_as::<_, PriceCurrency>(&format!(
            "INSERT INTO price_currency (currency, price, tier_id) VALUES ($1, $2, $3) RETURNING {PRICE_CURRENCY_COLUMNS}"
        ))
        .bind(currency.as_str())
        .bind(amount)
        .bind(tier_id)
        .fetch_one(&self.pool)
        .await?;

        info!(
            tier = tier_id,
            currency = currency.as_str(),
            price = %row.price,
            "currency price added"
        );
        Ok(row)
    }

    pub async fn remove_currency_price(&self, price_currency_id: i64) -> MarketResult<()> {
        let result = sqlx::query("DELETE FROM price_currency WHERE id = $1")
            .bind(price_currency_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MarketError::NotFound {
                entity: "price_currency",
                id: price_currency_id,
            });
        }
        info!(price_currency = price_currency_id, "currency price removed");
        Ok(())
    }
}
