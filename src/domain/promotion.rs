//! Promotion types: time-windowed earn multipliers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::decimal::Decimal;
use super::primitives::TimeMs;

/// Promotion category. `Seasonal` is the reserved kind written by the
/// manual override controls and takes priority on the simple earn path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromotionKind {
    Campaign,
    Seasonal,
}

impl PromotionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PromotionKind::Campaign => "campaign",
            PromotionKind::Seasonal => "seasonal",
        }
    }
}

impl fmt::Display for PromotionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PromotionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "campaign" => Ok(PromotionKind::Campaign),
            "seasonal" => Ok(PromotionKind::Seasonal),
            other => Err(format!("unknown promotion kind: {}", other)),
        }
    }
}

/// An earn multiplier campaign, evaluated at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    pub id: i64,
    pub kind: PromotionKind,
    pub active: bool,
    /// Multiplier >= 1 applied to base-earned points.
    pub multiplier: Decimal,
    pub starts_at: TimeMs,
    /// None means open-ended (seasonal overrides stay active until
    /// deactivated).
    pub ends_at: Option<TimeMs>,
}

impl Promotion {
    /// True when `active` and `now` falls within the window.
    pub fn is_active_at(&self, now: TimeMs) -> bool {
        if !self.active || now < self.starts_at {
            return false;
        }
        match self.ends_at {
            Some(end) => now <= end,
            None => true,
        }
    }
}
