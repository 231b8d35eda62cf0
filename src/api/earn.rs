use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::domain::{Decimal, EarnReason, TimeMs, UserId};
use crate::engine::MultiplierPolicy;
use crate::error::AppError;

/// Multiplier policy as selected by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyParam {
    HighestActive,
    CompoundAll,
}

impl From<PolicyParam> for MultiplierPolicy {
    fn from(value: PolicyParam) -> Self {
        match value {
            PolicyParam::HighestActive => MultiplierPolicy::HighestActive,
            PolicyParam::CompoundAll => MultiplierPolicy::CompoundAll,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewRequest {
    pub amount: Decimal,
    /// Defaults to highest-active, the storefront display policy.
    pub policy: Option<PolicyParam>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResponse {
    pub earned: i64,
    pub currency: String,
}

/// Simple-path earn preview. Promotion lookup trouble degrades to the base
/// rate inside the engine; only malformed input is rejected.
pub async fn preview_earn(
    State(state): State<AppState>,
    Json(req): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    if req.amount.is_negative() {
        return Err(AppError::InvalidArgument(
            "amount must be non-negative".to_string(),
        ));
    }

    let policy = req
        .policy
        .map(MultiplierPolicy::from)
        .unwrap_or(MultiplierPolicy::HighestActive);

    let earned = state
        .ledger
        .calculate_earned(req.amount, policy, TimeMs::now())
        .await;

    Ok(Json(PreviewResponse {
        earned,
        currency: "SPIRALS".to_string(),
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnRequest {
    pub user_id: String,
    pub amount_spent: Decimal,
    pub order_id: Option<String>,
    pub retailer_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnResponse {
    pub earned: i64,
    pub entry_id: i64,
    pub order_id: Option<String>,
    pub balance: i64,
}

/// Audited earn: validate, compute with compounding multipliers, then
/// append the ledger entry. The calculation itself never writes; this
/// adapter sequences the two engine calls.
pub async fn record_earn(
    State(state): State<AppState>,
    Json(req): Json<EarnRequest>,
) -> Result<Json<EarnResponse>, AppError> {
    let user_id = UserId::new(req.user_id);

    let earned = state
        .ledger
        .calculate_earned_secure(
            &user_id,
            req.amount_spent,
            MultiplierPolicy::CompoundAll,
            TimeMs::now(),
        )
        .await?;

    let entry = state
        .ledger
        .record_earn(
            &user_id,
            earned,
            EarnReason::EarnPurchase,
            req.order_id,
            req.retailer_id,
        )
        .await?;

    let balance = state.ledger.balance(&user_id).await.balance;

    Ok(Json(EarnResponse {
        earned,
        entry_id: entry.id,
        order_id: entry.order_id,
        balance,
    }))
}
