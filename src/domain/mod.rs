//! Domain types for the SPIRAL loyalty ledger and cart fulfillment core.
//!
//! This module provides:
//! - Lossless money/multiplier handling via a Decimal wrapper
//! - Domain primitives: TimeMs, UserId, SessionId
//! - Ledger entry, promotion, and cart item types with JSON serialization

pub mod cart;
pub mod decimal;
pub mod ledger;
pub mod primitives;
pub mod promotion;

pub use cart::{CartItem, FulfillmentGroup, FulfillmentMethod, NO_MALL, UNKNOWN_STORE};
pub use decimal::Decimal;
pub use ledger::{BalanceSummary, EarnReason, LedgerEntry, NewLedgerEntry};
pub use primitives::{SessionId, TimeMs, UserId};
pub use promotion::{Promotion, PromotionKind};
