use std::str::FromStr;

use addon_market::market::{Currency, LocalizedName, MarketError, NewPrice, PriceService};
use rust_decimal::Decimal;
use sqlx::PgPool;

// key: market-prices-tests -> tiers,currency overrides

fn dec(value: &str) -> Decimal {
    Decimal::from_str(value).unwrap()
}

fn tier(name: &str, price: &str) -> NewPrice {
    NewPrice {
        name: LocalizedName::new().with("en-US", name),
        price: dec(price),
        active: true,
    }
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL with Postgres server"]
async fn active_tiers_exclude_soft_disabled(pool: PgPool) {
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let service = PriceService::new(pool.clone());
    let cheap = service.create_tier(tier("Tier 1", "0.99")).await.unwrap();
    let pricey = service.create_tier(tier("Tier 2", "4.99")).await.unwrap();
    let retired = service.create_tier(tier("Tier 0", "0.49")).await.unwrap();
    service.set_tier_active(retired.id, false).await.unwrap();

    let active = service.list_active_tiers().await.unwrap();
    let ids: Vec<i64> = active.iter().map(|tier| tier.id).collect();
    assert_eq!(ids, vec![cheap.id, pricey.id]);
    assert_eq!(active[0].price.to_string(), "0.99");
    assert_eq!(active[0].to_string(), "Tier 1: 0.99");

    assert_eq!(service.list_tiers().await.unwrap().len(), 3);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL with Postgres server"]
async fn invalid_amounts_are_rejected_before_insert(pool: PgPool) {
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let service = PriceService::new(pool.clone());
    let err = service
        .create_tier(tier("Broken", "-1.00"))
        .await
        .expect_err("negative tiers are invalid");
    assert!(matches!(err, MarketError::InvalidAmount { .. }));
    assert!(service.list_tiers().await.unwrap().is_empty());
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL with Postgres server"]
async fn currency_lookup_prefers_first_row(pool: PgPool) {
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let service = PriceService::new(pool.clone());
    let tier = service.create_tier(tier("Tier 1", "0.99")).await.unwrap();

    assert!(service
        .currency_price(tier.id, Currency::Eur)
        .await
        .unwrap()
        .is_none());

    let first = service
        .add_currency_price(tier.id, Currency::Eur, dec("0.89"))
        .await
        .unwrap();
    service
        .add_currency_price(tier.id, Currency::Eur, dec("0.79"))
        .await
        .unwrap();
    service
        .add_currency_price(tier.id, Currency::Jpy, dec("99"))
        .await
        .unwrap();

    let euro = service
        .currency_price(tier.id, Currency::Eur)
        .await
        .unwrap()
        .expect("euro override");
    assert_eq!(euro.id, first.id);
    assert_eq!(euro.price, dec("0.89"));
    assert_eq!(euro.describe(&tier), "Tier 1, EUR: 0.89");

    assert_eq!(service.tier_currencies(tier.id).await.unwrap().len(), 3);
}

#[sqlx::test]
#[ignore = "requires DATABASE_URL with Postgres server"]
async fn deleting_a_tier_drops_its_currencies(pool: PgPool) {
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    let service = PriceService::new(pool.clone());
    let tier = service.create_tier(tier("Tier 3", "9.99")).await.unwrap();
    let row = service
        .add_currency_price(tier.id, Currency::Gbp, dec("8.49"))
        .await
        .unwrap();

    service.remove_currency_price(row.id).await.unwrap();
    assert!(matches!(
        service.remove_currency_price(row.id).await,
        Err(MarketError::NotFound { .. })
    ));

    service
        .add_currency_price(tier.id, Currency::Cad, dec("12.99"))
        .await
        .unwrap();
    service.delete_tier(tier.id).await.unwrap();

    let leftover: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM price_currency WHERE tier_id = $1")
        .bind(tier.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(leftover, 0);
    assert!(matches!(
        service.get_tier(tier.id).await,
        Err(MarketError::NotFound { .. })
    ));
    assert!(matches!(
        service.add_currency_price(tier.id, Currency::Cad, dec("1.00")).await,
        Err(MarketError::NotFound { .. })
    ));
}
