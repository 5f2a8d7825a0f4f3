use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use super::contributions::{Contribution, ContributionObserver, ContributionType};
use super::models::AddonPurchase;
use super::MarketResult;

/// What a contribution write means for the purchase table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseAction {
    Ignore,
    Grant,
    Revoke,
}

/// key: market-reconcile-plan -> type whitelist
pub fn plan_reconciliation(kind: ContributionType, raw: bool) -> PurchaseAction {
    if raw {
        return PurchaseAction::Ignore;
    }
    match kind.normalized() {
        ContributionType::Purchase => PurchaseAction::Grant,
        ContributionType::Refund | ContributionType::Chargeback => PurchaseAction::Revoke,
        _ => PurchaseAction::Ignore,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Skipped,
    Granted(AddonPurchase),
    /// Ids of the deleted rows; empty when nothing was held.
    Revoked(Vec<i64>),
}

/// key: market-reconcile -> keep addon_purchase in line with payment events
///
/// Runs on the caller's connection so it shares the contribution write's
/// transaction. Purchases always insert a new row; refunds and chargebacks
/// delete every row for the pair, one at a time.
pub async fn reconcile_addon_purchase(
    conn: &mut PgConnection,
    contribution: &Contribution,
    raw: bool,
) -> Result<ReconcileOutcome, sqlx::Error> {
    let action = plan_reconciliation(contribution.kind, raw);
    if action == PurchaseAction::Ignore {
        return Ok(ReconcileOutcome::Skipped);
    }

    let addon_id = contribution.addon_id;
    let user_id = contribution.user_id;
    debug!(
        kind = contribution.kind.label(),
        addon = addon_id,
        user = user_id,
        contribution = contribution.id,
        "processing addon purchase"
    );

    match action {
        PurchaseAction::Grant => {
            let purchase = sqlx::query_as::<_, AddonPurchase>(
                r#"
                INSERT INTO addon_purchase (addon_id, user_id)
                VALUES ($1, $2)
                RETURNING id, addon_id, user_id, created, modified
                "#,
            )
            .bind(addon_id)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

            info!(
                purchase = purchase.id,
                addon = addon_id,
                user = user_id,
                contribution = contribution.id,
                "created addon purchase"
            );
            Ok(ReconcileOutcome::Granted(purchase))
        }
        PurchaseAction::Revoke => {
            let held: Vec<i64> = sqlx::query_scalar(
                "SELECT id FROM addon_purchase WHERE addon_id = $1 AND user_id = $2 ORDER BY id",
            )
            .bind(addon_id)
            .bind(user_id)
            .fetch_all(&mut *conn)
            .await?;

            for purchase_id in held.iter().copied() {
                sqlx::query("DELETE FROM addon_purchase WHERE id = $1")
                    .bind(purchase_id)
                    .execute(&mut *conn)
                    .await?;
                info!(
                    purchase = purchase_id,
                    addon = addon_id,
                    user = user_id,
                    contribution = contribution.id,
                    kind = contribution.kind.label(),
                    "deleted addon purchase"
                );
            }
            Ok(ReconcileOutcome::Revoked(held))
        }
        PurchaseAction::Ignore => Ok(ReconcileOutcome::Skipped),
    }
}

/// Contribution observer that applies [`reconcile_addon_purchase`].
pub struct AddonPurchaseReconciler;

#[async_trait]
impl ContributionObserver for AddonPurchaseReconciler {
    fn name(&self) -> &'static str {
        "create_addon_purchase"
    }

    async fn on_contribution_saved(
        &self,
        conn: &mut PgConnection,
        contribution: &Contribution,
        raw: bool,
    ) -> Result<(), sqlx::Error> {
        reconcile_addon_purchase(conn, contribution, raw).await?;
        Ok(())
    }
}

/// key: market-entitlements -> read side of addon_purchase
#[derive(Clone)]
pub struct PurchaseService {
    pool: PgPool,
}

impl PurchaseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn purchases_for(
        &self,
        addon_id: i64,
        user_id: i64,
    ) -> MarketResult<Vec<AddonPurchase>> {
        let rows = sqlx::query_as::<_, AddonPurchase>(
            r#"
            SELECT id, addon_id, user_id, created, modified
            FROM addon_purchase
            WHERE addon_id = $1 AND user_id = $2
            ORDER BY id
            "#,
        )
        .bind(addon_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn has_purchased(&self, addon_id: i64, user_id: i64) -> MarketResult<bool> {
        let held: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM addon_purchase WHERE addon_id = $1 AND user_id = $2)",
        )
        .bind(addon_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(held)
    }

    pub async fn purchases_for_user(&self, user_id: i64) -> MarketResult<Vec<AddonPurchase>> {
        let rows = sqlx::query_as::<_, AddonPurchase>(
            r#"
            SELECT id, addon_id, user_id, created, modified
            FROM addon_purchase
            WHERE user_id = $1
            ORDER BY created DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_loads_never_reconcile() {
        for code in 0..6 {
            let kind = ContributionType::from_code(code);
            assert_eq!(plan_reconciliation(kind, true), PurchaseAction::Ignore);
        }
    }

    #[test]
    fn numeric_code_decides_the_action() {
        assert_eq!(
            plan_reconciliation(ContributionType::Other(1), false),
            PurchaseAction::Grant
        );
        assert_eq!(
            plan_reconciliation(ContributionType::Other(2), false),
            PurchaseAction::Revoke
        );
        assert_eq!(
            plan_reconciliation(ContributionType::Other(3), false),
            PurchaseAction::Revoke
        );
    }

    #[test]
    fn only_tracked_types_touch_purchases() {
        assert_eq!(
            plan_reconciliation(ContributionType::Purchase, false),
            PurchaseAction::Grant
        );
        assert_eq!(
            plan_reconciliation(ContributionType::Refund, false),
            PurchaseAction::Revoke
        );
        assert_eq!(
            plan_reconciliation(ContributionType::Chargeback, false),
            PurchaseAction::Revoke
        );
        for kind in [
            ContributionType::Voluntary,
            ContributionType::Pending,
            ContributionType::Other(9),
        ] {
            assert_eq!(plan_reconciliation(kind, false), PurchaseAction::Ignore);
        }
    }
}
