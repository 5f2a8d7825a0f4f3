use axum::{
    routing::{get, post},
    Router,
};

use crate::market::api;

pub fn api_routes() -> Router {
    Router::new()
        .route("/api/market/prices", get(api::list_active_prices))
        .route(
            "/api/market/prices/:tier_id/currencies/:code",
            get(api::lookup_currency_price),
        )
        .route("/api/market/contributions", post(api::record_contribution))
        .route(
            "/api/market/addons/:addon_id/purchases/:user_id",
            get(api::purchase_status),
        )
}
