//! SPIRALs ledger engine: balance queries and earn calculations.
//!
//! Balances are never cached as ground truth; every query re-sums the
//! user's append-only entries. Earn calculations are pure over the amount
//! and the currently-active promotions.

use crate::domain::{
    BalanceSummary, Decimal, EarnReason, LedgerEntry, NewLedgerEntry, Promotion, PromotionKind,
    TimeMs, UserId,
};
use crate::store::{PromotionStore, StoreError, TransactionStore};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Loyalty currency label returned with every balance.
pub const CURRENCY: &str = "SPIRALS";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// How active promotion multipliers combine into one effective multiplier.
///
/// `HighestActive` picks the single largest multiplier (seasonal overrides
/// win outright); `CompoundAll` multiplies every active multiplier
/// together. The simple earn path defaults to the former, the audited path
/// to the latter; callers select explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiplierPolicy {
    HighestActive,
    CompoundAll,
}

/// Combine active promotions into one multiplier under the given policy.
///
/// With no active promotions the result is 1.
pub fn effective_multiplier(promotions: &[Promotion], policy: MultiplierPolicy) -> Decimal {
    match policy {
        MultiplierPolicy::HighestActive => {
            let seasonal = promotions
                .iter()
                .filter(|p| p.kind == PromotionKind::Seasonal)
                .map(|p| p.multiplier)
                .max();
            if let Some(multiplier) = seasonal {
                return multiplier;
            }
            promotions
                .iter()
                .map(|p| p.multiplier)
                .max()
                .unwrap_or_else(Decimal::one)
        }
        MultiplierPolicy::CompoundAll => promotions
            .iter()
            .fold(Decimal::one(), |acc, p| acc * p.multiplier),
    }
}

/// Base rate is 1 point per currency unit; result is rounded half away
/// from zero and never negative.
pub fn earned_points(amount: Decimal, multiplier: Decimal) -> i64 {
    (amount * multiplier).round_points()
}

/// Tunables read from configuration at startup.
#[derive(Debug, Clone)]
pub struct LedgerSettings {
    /// Upper bound on entries fetched per balance query.
    pub query_cap: u32,
    /// Known demo identity that receives a fixed balance when the store is
    /// unreachable or holds nothing for it.
    pub demo_user_id: Option<UserId>,
    pub demo_balance: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            query_cap: 10_000,
            demo_user_id: None,
            demo_balance: 0,
        }
    }
}

/// Maintains the auditable point record and answers balance queries.
pub struct LedgerEngine {
    transactions: Arc<dyn TransactionStore>,
    promotions: Arc<dyn PromotionStore>,
    settings: LedgerSettings,
}

impl LedgerEngine {
    pub fn new(
        transactions: Arc<dyn TransactionStore>,
        promotions: Arc<dyn PromotionStore>,
        settings: LedgerSettings,
    ) -> Self {
        Self {
            transactions,
            promotions,
            settings,
        }
    }

    fn is_demo_user(&self, user_id: &UserId) -> bool {
        self.settings.demo_user_id.as_ref() == Some(user_id)
    }

    /// Sum all entries for a user. Unknown users get a zero balance, and a
    /// failing store degrades to defaults instead of surfacing an error.
    pub async fn balance(&self, user_id: &UserId) -> BalanceSummary {
        let entries = match self
            .transactions
            .query_by_user(user_id, self.settings.query_cap)
            .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "ledger read failed, serving fallback balance");
                let balance = if self.is_demo_user(user_id) {
                    self.settings.demo_balance
                } else {
                    0
                };
                return BalanceSummary {
                    balance,
                    currency: CURRENCY.to_string(),
                    last_earned: TimeMs::now(),
                };
            }
        };

        if entries.is_empty() && self.is_demo_user(user_id) {
            return BalanceSummary {
                balance: self.settings.demo_balance,
                currency: CURRENCY.to_string(),
                last_earned: TimeMs::now(),
            };
        }

        let balance = entries.iter().map(|e| e.delta).sum();
        let last_earned = entries
            .iter()
            .map(|e| e.created_at)
            .max()
            .unwrap_or_else(TimeMs::now);

        BalanceSummary {
            balance,
            currency: CURRENCY.to_string(),
            last_earned,
        }
    }

    /// Simple earn path: base = amount, multiplier per `policy` over the
    /// promotions active at `now`. A failed promotion lookup falls back
    /// silently to multiplier 1.
    pub async fn calculate_earned(
        &self,
        amount: Decimal,
        policy: MultiplierPolicy,
        now: TimeMs,
    ) -> i64 {
        let multiplier = match self.promotions.query_active(now).await {
            Ok(active) => effective_multiplier(&active, policy),
            Err(e) => {
                warn!(error = %e, "promotion lookup failed, using base multiplier");
                Decimal::one()
            }
        };
        earned_points(amount, multiplier)
    }

    /// Audited earn path. Rejects malformed input before any side effect;
    /// never writes to the ledger.
    pub async fn calculate_earned_secure(
        &self,
        user_id: &UserId,
        amount_spent: Decimal,
        policy: MultiplierPolicy,
        now: TimeMs,
    ) -> Result<i64, LedgerError> {
        if user_id.is_empty() {
            return Err(LedgerError::InvalidArgument(
                "userId must be a non-empty identifier".to_string(),
            ));
        }
        if !amount_spent.is_positive() {
            return Err(LedgerError::InvalidArgument(
                "amountSpent must be strictly positive".to_string(),
            ));
        }
        Ok(self.calculate_earned(amount_spent, policy, now).await)
    }

    /// Append one earn entry. The only mutating operation on the ledger.
    pub async fn record_earn(
        &self,
        user_id: &UserId,
        points: i64,
        reason: EarnReason,
        order_id: Option<String>,
        retailer_id: Option<String>,
    ) -> Result<LedgerEntry, LedgerError> {
        if points <= 0 {
            return Err(LedgerError::InvalidArgument(
                "points must be positive".to_string(),
            ));
        }

        let order_id =
            order_id.unwrap_or_else(|| format!("manual_{}", TimeMs::now().as_i64()));

        let entry = self
            .transactions
            .append(NewLedgerEntry {
                user_id: Some(user_id.clone()),
                retailer_id,
                order_id: Some(order_id),
                delta: points,
                reason,
            })
            .await?;

        Ok(entry)
    }

    /// Write the reserved seasonal override through the promotion store.
    pub async fn activate_seasonal(&self, multiplier: Decimal) -> Result<(), LedgerError> {
        if multiplier < Decimal::one() {
            return Err(LedgerError::InvalidArgument(
                "multiplier must be >= 1".to_string(),
            ));
        }
        self.promotions
            .upsert_seasonal(multiplier, TimeMs::now())
            .await?;
        Ok(())
    }

    /// Clear the seasonal override.
    pub async fn deactivate_seasonal(&self) -> Result<(), LedgerError> {
        self.promotions.deactivate_seasonal().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn promo(id: i64, kind: PromotionKind, multiplier: &str) -> Promotion {
        Promotion {
            id,
            kind,
            active: true,
            multiplier: dec(multiplier),
            starts_at: TimeMs::new(0),
            ends_at: None,
        }
    }

    fn engine(store: Arc<MemoryStore>) -> LedgerEngine {
        LedgerEngine::new(store.clone(), store, LedgerSettings::default())
    }

    fn user() -> UserId {
        UserId::new("user1".to_string())
    }

    #[test]
    fn test_effective_multiplier_no_promotions() {
        assert_eq!(
            effective_multiplier(&[], MultiplierPolicy::HighestActive),
            Decimal::one()
        );
        assert_eq!(
            effective_multiplier(&[], MultiplierPolicy::CompoundAll),
            Decimal::one()
        );
    }

    #[test]
    fn test_highest_active_picks_max_not_product() {
        let promos = vec![
            promo(1, PromotionKind::Campaign, "1.5"),
            promo(2, PromotionKind::Campaign, "2"),
        ];
        assert_eq!(
            effective_multiplier(&promos, MultiplierPolicy::HighestActive),
            dec("2")
        );
    }

    #[test]
    fn test_seasonal_wins_over_larger_campaign() {
        let promos = vec![
            promo(1, PromotionKind::Campaign, "3"),
            promo(2, PromotionKind::Seasonal, "2"),
        ];
        assert_eq!(
            effective_multiplier(&promos, MultiplierPolicy::HighestActive),
            dec("2")
        );
    }

    #[test]
    fn test_compound_all_multiplies_everything() {
        let promos = vec![
            promo(1, PromotionKind::Campaign, "2"),
            promo(2, PromotionKind::Seasonal, "1.5"),
        ];
        assert_eq!(
            effective_multiplier(&promos, MultiplierPolicy::CompoundAll),
            dec("3")
        );
    }

    #[test]
    fn test_earned_points_rounding() {
        assert_eq!(earned_points(dec("129.99"), Decimal::one()), 130);
        assert_eq!(earned_points(dec("129.99"), dec("2")), 260);
        assert_eq!(earned_points(dec("0"), dec("5")), 0);
    }

    #[tokio::test]
    async fn test_balance_additivity() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());

        for (delta, reason) in [
            (100, EarnReason::EarnPurchase),
            (20, EarnReason::Bonus),
        ] {
            engine
                .record_earn(&user(), delta, reason, None, None)
                .await
                .unwrap();
        }
        // redemptions are appended by the store owner, not record_earn
        store
            .append(NewLedgerEntry {
                user_id: Some(user()),
                retailer_id: None,
                order_id: None,
                delta: -30,
                reason: EarnReason::RedeemPurchase,
            })
            .await
            .unwrap();

        let summary = engine.balance(&user()).await;
        assert_eq!(summary.balance, 90);
        assert_eq!(summary.currency, "SPIRALS");
    }

    #[tokio::test]
    async fn test_balance_unknown_user_is_zero_not_error() {
        let store = Arc::new(MemoryStore::new());
        let summary = engine(store).balance(&UserId::new("nobody".to_string())).await;
        assert_eq!(summary.balance, 0);
    }

    #[tokio::test]
    async fn test_balance_degrades_on_store_failure() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_reads(true);
        let summary = engine(store).balance(&user()).await;
        assert_eq!(summary.balance, 0);
    }

    #[tokio::test]
    async fn test_demo_user_fallback_balance() {
        let store = Arc::new(MemoryStore::new());
        let settings = LedgerSettings {
            demo_user_id: Some(UserId::new("demo".to_string())),
            demo_balance: 1250,
            ..LedgerSettings::default()
        };
        let engine = LedgerEngine::new(store.clone(), store.clone(), settings);

        // empty store: demo identity gets the configured balance
        let summary = engine.balance(&UserId::new("demo".to_string())).await;
        assert_eq!(summary.balance, 1250);

        // store outage: same fallback
        store.set_fail_reads(true);
        let summary = engine.balance(&UserId::new("demo".to_string())).await;
        assert_eq!(summary.balance, 1250);
    }

    #[tokio::test]
    async fn test_calculate_earned_no_promotion() {
        let store = Arc::new(MemoryStore::new());
        let earned = engine(store)
            .calculate_earned(dec("129.99"), MultiplierPolicy::HighestActive, TimeMs::new(0))
            .await;
        assert_eq!(earned, 130);
    }

    #[tokio::test]
    async fn test_calculate_earned_with_promotion() {
        let store = Arc::new(MemoryStore::new().with_promotion(promo(
            1,
            PromotionKind::Campaign,
            "2",
        )));
        let earned = engine(store)
            .calculate_earned(dec("129.99"), MultiplierPolicy::HighestActive, TimeMs::new(50))
            .await;
        assert_eq!(earned, 260);
    }

    #[tokio::test]
    async fn test_calculate_earned_store_failure_falls_back_to_base() {
        let store = Arc::new(MemoryStore::new().with_promotion(promo(
            1,
            PromotionKind::Campaign,
            "2",
        )));
        store.set_fail_reads(true);
        let earned = engine(store)
            .calculate_earned(dec("100"), MultiplierPolicy::HighestActive, TimeMs::new(50))
            .await;
        assert_eq!(earned, 100);
    }

    #[tokio::test]
    async fn test_secure_rejects_empty_user_without_side_effect() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let result = engine
            .calculate_earned_secure(
                &UserId::new(String::new()),
                dec("10"),
                MultiplierPolicy::CompoundAll,
                TimeMs::new(0),
            )
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_secure_rejects_non_positive_amount() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        for amount in ["0", "-5"] {
            let result = engine
                .calculate_earned_secure(
                    &user(),
                    dec(amount),
                    MultiplierPolicy::CompoundAll,
                    TimeMs::new(0),
                )
                .await;
            assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        }
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_secure_compounds_active_multipliers() {
        let store = Arc::new(
            MemoryStore::new()
                .with_promotion(promo(1, PromotionKind::Campaign, "2"))
                .with_promotion(promo(2, PromotionKind::Campaign, "1.5")),
        );
        let earned = engine(store)
            .calculate_earned_secure(&user(), dec("100"), MultiplierPolicy::CompoundAll, TimeMs::new(50))
            .await
            .unwrap();
        assert_eq!(earned, 300);
    }

    #[tokio::test]
    async fn test_record_earn_requires_positive_points() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store.clone());
        let result = engine
            .record_earn(&user(), 0, EarnReason::Bonus, None, None)
            .await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
        assert_eq!(store.entry_count(), 0);
    }

    #[tokio::test]
    async fn test_record_earn_generates_manual_order_id() {
        let store = Arc::new(MemoryStore::new());
        let entry = engine(store)
            .record_earn(&user(), 25, EarnReason::Invite, None, None)
            .await
            .unwrap();
        assert!(entry.order_id.unwrap().starts_with("manual_"));
        assert_eq!(entry.delta, 25);
    }

    #[tokio::test]
    async fn test_seasonal_activation_flows_into_simple_path() {
        let store = Arc::new(MemoryStore::new());
        let engine = engine(store);
        engine.activate_seasonal(dec("3")).await.unwrap();

        let earned = engine
            .calculate_earned(dec("10"), MultiplierPolicy::HighestActive, TimeMs::now())
            .await;
        assert_eq!(earned, 30);

        engine.deactivate_seasonal().await.unwrap();
        let earned = engine
            .calculate_earned(dec("10"), MultiplierPolicy::HighestActive, TimeMs::now())
            .await;
        assert_eq!(earned, 10);
    }

    #[tokio::test]
    async fn test_activate_seasonal_rejects_sub_unit_multiplier() {
        let store = Arc::new(MemoryStore::new());
        let result = engine(store).activate_seasonal(dec("0.5")).await;
        assert!(matches!(result, Err(LedgerError::InvalidArgument(_))));
    }
}
