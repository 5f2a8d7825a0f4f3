use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, PgPool, Row};
use tracing::{debug, info};

use super::models::money_scale;
use super::purchases::AddonPurchaseReconciler;
use super::{MarketError, MarketResult};

/// Payment event tag stored in `contributions.type`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i16", into = "i16")]
pub enum ContributionType {
    Voluntary,
    Purchase,
    Refund,
    Chargeback,
    Pending,
    Other(i16),
}

impl ContributionType {
    pub fn code(&self) -> i16 {
        match self {
            ContributionType::Voluntary => 0,
            ContributionType::Purchase => 1,
            ContributionType::Refund => 2,
            ContributionType::Chargeback => 3,
            ContributionType::Pending => 4,
            ContributionType::Other(code) => *code,
        }
    }

    pub fn from_code(code: i16) -> Self {
        match code {
            0 => ContributionType::Voluntary,
            1 => ContributionType::Purchase,
            2 => ContributionType::Refund,
            3 => ContributionType::Chargeback,
            4 => ContributionType::Pending,
            other => ContributionType::Other(other),
        }
    }

    /// Maps `Other` carrying a known code onto its named variant.
    pub fn normalized(self) -> Self {
        Self::from_code(self.code())
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContributionType::Voluntary => "Voluntary",
            ContributionType::Purchase => "Purchase",
            ContributionType::Refund => "Refund",
            ContributionType::Chargeback => "Chargeback",
            ContributionType::Pending => "Pending",
            ContributionType::Other(_) => "Other",
        }
    }
}

impl From<i16> for ContributionType {
    fn from(code: i16) -> Self {
        Self::from_code(code)
    }
}

impl From<ContributionType> for i16 {
    fn from(kind: ContributionType) -> Self {
        kind.code()
    }
}

/// key: market-contribution -> payment event row
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub id: i64,
    pub addon_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ContributionType,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for Contribution {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let code: i16 = row.try_get("type")?;
        Ok(Self {
            id: row.try_get("id")?,
            addon_id: row.try_get("addon_id")?,
            user_id: row.try_get("user_id")?,
            kind: ContributionType::from_code(code),
            amount: row
                .try_get::<Option<Decimal>, _>("amount")?
                .map(money_scale),
            currency: row.try_get("currency")?,
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewContribution {
    pub addon_id: i64,
    pub user_id: i64,
    pub kind: ContributionType,
    pub amount: Option<Decimal>,
    pub currency: Option<String>,
}

impl NewContribution {
    pub fn new(addon_id: i64, user_id: i64, kind: ContributionType) -> Self {
        Self {
            addon_id,
            user_id,
            kind: kind.normalized(),
            amount: None,
            currency: None,
        }
    }

    /// Checks the payment fields against the `contributions` column widths.
    pub fn validate(&self) -> MarketResult<()> {
        if let Some(amount) = self.amount {
            if amount.normalize().scale() > 2 {
                return Err(MarketError::InvalidAmount {
                    amount,
                    reason: "at most two decimal places are allowed",
                });
            }
            if amount.abs() > max_contribution_amount() {
                return Err(MarketError::InvalidAmount {
                    amount,
                    reason: "exceeds nine significant digits",
                });
            }
        }
        if let Some(code) = &self.currency {
            let well_formed = (1..=3).contains(&code.len())
                && code.chars().all(|c| c.is_ascii_uppercase());
            if !well_formed {
                return Err(MarketError::UnsupportedCurrency(code.clone()));
            }
        }
        Ok(())
    }
}

/// Largest amount `contributions.amount` (NUMERIC(9,2)) holds.
fn max_contribution_amount() -> Decimal {
    Decimal::new(999_999_999, 2)
}

/// key: market-contribution-observer -> post-write hook
///
/// Observers run on the connection that wrote the contribution, inside the same
/// transaction. Returning an error aborts the write.
#[async_trait]
pub trait ContributionObserver: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_contribution_saved(
        &self,
        conn: &mut PgConnection,
        contribution: &Contribution,
        raw: bool,
    ) -> Result<(), sqlx::Error>;
}

/// key: market-contribution-ledger -> durable write + synchronous observers
#[derive(Clone)]
pub struct ContributionLedger {
    pool: PgPool,
    observers: Vec<Arc<dyn ContributionObserver>>,
}

impl ContributionLedger {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            observers: Vec::new(),
        }
    }

    /// Ledger wired with the purchase reconciler.
    pub fn with_default_observers(pool: PgPool) -> Self {
        Self::new(pool).observe(Arc::new(AddonPurchaseReconciler))
    }

    pub fn observe(mut self, observer: Arc<dyn ContributionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Inserts the contribution and notifies observers in one transaction.
    /// `raw` marks fixture or bulk loads.
    pub async fn record(&self, new: NewContribution, raw: bool) -> MarketResult<Contribution> {
        new.validate()?;
        let mut tx = self.pool.begin().await?;

        let contribution = sqlx::query_as::<_, Contribution>(
            r#"
            INSERT INTO contributions (addon_id, user_id, type, amount, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, addon_id, user_id, type, amount, currency, created, modified
            "#,
        )
        .bind(new.addon_id)
        .bind(new.user_id)
        .bind(new.kind.code())
        .bind(new.amount)
        .bind(new.currency.as_deref())
        .fetch_one(&mut *tx)
        .await?;

        info!(
            contribution = contribution.id,
            addon = contribution.addon_id,
            user = contribution.user_id,
            kind = contribution.kind.label(),
            raw,
            "contribution recorded"
        );

        self.notify(&mut tx, &contribution, raw).await?;
        tx.commit().await?;
        Ok(contribution)
    }

    /// Retags an existing contribution, e.g. when the payment provider reports a refund
    /// against it, and notifies observers in the same transaction.
    pub async fn update_type(
        &self,
        contribution_id: i64,
        kind: ContributionType,
        raw: bool,
    ) -> MarketResult<Contribution> {
        let mut tx = self.pool.begin().await?;

        let contribution = sqlx::query_as::<_, Contribution>(
            r#"
            UPDATE contributions
            SET type = $2, modified = NOW()
            WHERE id = $1
            RETURNING id, addon_id, user_id, type, amount, currency, created, modified
            "#,
        )
        .bind(contribution_id)
        .bind(kind.code())
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(MarketError::NotFound {
            entity: "contribution",
            id: contribution_id,
        })?;

        info!(
            contribution = contribution.id,
            kind = contribution.kind.label(),
            raw,
            "contribution type updated"
        );

        self.notify(&mut tx, &contribution, raw).await?;
        tx.commit().await?;
        Ok(contribution)
    }

    pub async fn get(&self, contribution_id: i64) -> MarketResult<Option<Contribution>> {
        let record = sqlx::query_as::<_, Contribution>(
            "SELECT id, addon_id, user_id, type, amount, currency, created, modified FROM contributions WHERE id = $1",
        )
        .bind(contribution_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn notify(
        &self,
        conn: &mut PgConnection,
        contribution: &Contribution,
        raw: bool,
    ) -> MarketResult<()> {
        for observer in &self.observers {
            debug!(
                observer = observer.name(),
                contribution = contribution.id,
                "dispatching contribution write"
            );
            observer
                .on_contribution_saved(&mut *conn, contribution, raw)
                .await?;
        }
        Ok(())
    }
}
