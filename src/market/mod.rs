pub mod api;
pub mod contributions;
pub mod currency;
pub mod models;
pub mod prices;
pub mod purchases;

use thiserror::Error;

pub use api::{
    list_active_prices as market_list_active_prices, lookup_currency_price as market_currency_price,
    purchase_status as market_purchase_status, record_contribution as market_record_contribution,
    PurchaseStatus, RecordContributionRequest,
};
pub use contributions::{
    Contribution, ContributionLedger, ContributionObserver, ContributionType, NewContribution,
};
pub use currency::Currency;
pub use models::{validate_amount, AddonPurchase, LocalizedName, NewPrice, Price, PriceCurrency};
pub use prices::PriceService;
pub use purchases::{
    plan_reconciliation, reconcile_addon_purchase, AddonPurchaseReconciler, PurchaseAction,
    PurchaseService, ReconcileOutcome,
};

/// key: market-errors -> validation + persistence
#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("invalid amount {amount}: {reason}")]
    InvalidAmount {
        amount: rust_decimal::Decimal,
        reason: &'static str,
    },
    #[error("unsupported currency `{0}`")]
    UnsupportedCurrency(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },
}

pub type MarketResult<T> = Result<T, MarketError>;
