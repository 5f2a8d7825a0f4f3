use axum::{
    extract::{Extension, Path},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::{
    AddonPurchase, Contribution, ContributionLedger, ContributionType, Currency, MarketError,
    NewContribution, Price, PriceCurrency, PriceService, PurchaseService,
};
use crate::error::{AppError, AppResult};

/// key: market-api -> internal json endpoints
pub async fn list_active_prices(
    Extension(pool): Extension<PgPool>,
) -> AppResult<Json<Vec<Price>>> {
    let tiers = PriceService::new(pool).list_active_tiers().await?;
    Ok(Json(tiers))
}

pub async fn lookup_currency_price(
    Extension(pool): Extension<PgPool>,
    Path((tier_id, code)): Path<(i64, String)>,
) -> AppResult<Json<PriceCurrency>> {
    let currency = Currency::from_code(&code).ok_or(MarketError::UnsupportedCurrency(code))?;
    let row = PriceService::new(pool)
        .currency_price(tier_id, currency)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(row))
}

pub async fn record_contribution(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<RecordContributionRequest>,
) -> AppResult<Json<Contribution>> {
    let ledger = ContributionLedger::with_default_observers(pool);
    let raw = payload.raw.unwrap_or(false);
    let contribution = ledger.record(payload.into_new_contribution(), raw).await?;
    Ok(Json(contribution))
}

pub async fn purchase_status(
    Extension(pool): Extension<PgPool>,
    Path((addon_id, user_id)): Path<(i64, i64)>,
) -> AppResult<Json<PurchaseStatus>> {
    let purchases = PurchaseService::new(pool)
        .purchases_for(addon_id, user_id)
        .await?;
    Ok(Json(PurchaseStatus {
        purchased: !purchases.is_empty(),
        purchases,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecordContributionRequest {
    pub addon_id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub kind: ContributionType,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub raw: Option<bool>,
}

impl RecordContributionRequest {
    fn into_new_contribution(self) -> NewContribution {
        NewContribution {
            addon_id: self.addon_id,
            user_id: self.user_id,
            kind: self.kind,
            amount: self.amount,
            currency: self.currency,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PurchaseStatus {
    pub purchased: bool,
    pub purchases: Vec<AddonPurchase>,
}
