//! Ledger entry types for the SPIRALs loyalty balance.
//!
//! Entries are append-only: once written they are never updated or deleted,
//! and a balance is always recomputed as the sum of a user's deltas.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::primitives::{TimeMs, UserId};

/// Why a ledger entry exists. Closed set; unknown reasons are rejected at
/// the serde boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EarnReason {
    EarnPurchase,
    RedeemPurchase,
    Bonus,
    Invite,
    Seasonal,
}

impl EarnReason {
    /// Stable string form used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            EarnReason::EarnPurchase => "earn_purchase",
            EarnReason::RedeemPurchase => "redeem_purchase",
            EarnReason::Bonus => "bonus",
            EarnReason::Invite => "invite",
            EarnReason::Seasonal => "seasonal",
        }
    }
}

impl fmt::Display for EarnReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EarnReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earn_purchase" => Ok(EarnReason::EarnPurchase),
            "redeem_purchase" => Ok(EarnReason::RedeemPurchase),
            "bonus" => Ok(EarnReason::Bonus),
            "invite" => Ok(EarnReason::Invite),
            "seasonal" => Ok(EarnReason::Seasonal),
            other => Err(format!("unknown earn reason: {}", other)),
        }
    }
}

/// A single immutable point movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owner; None marks a system/orphan entry.
    pub user_id: Option<UserId>,
    pub retailer_id: Option<String>,
    pub order_id: Option<String>,
    /// Signed point delta: positive earn, negative redemption.
    pub delta: i64,
    pub reason: EarnReason,
    /// Set at insertion, never mutated.
    pub created_at: TimeMs,
}

/// An entry about to be appended; the store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: Option<UserId>,
    pub retailer_id: Option<String>,
    pub order_id: Option<String>,
    pub delta: i64,
    pub reason: EarnReason,
}

/// Balance summary returned by the ledger engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSummary {
    pub balance: i64,
    /// Always "SPIRALS".
    pub currency: String,
    /// Timestamp of the most recent entry, or query time if none exist.
    pub last_earned: TimeMs,
}
