//! Storage abstractions for ledger entries, promotions, and cart state.
//!
//! The engines depend on these traits only; SQLite (`crate::db::Repository`)
//! backs them in production and `MemoryStore` backs them in tests.

use crate::domain::{
    CartItem, Decimal, FulfillmentMethod, LedgerEntry, NewLedgerEntry, Promotion, SessionId,
    TimeMs, UserId,
};
use async_trait::async_trait;
use std::fmt;

pub mod memory;

pub use memory::MemoryStore;

/// Error type for store operations.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// Underlying storage failed (connection, I/O, corrupt row).
    Unavailable(String),
    /// A referenced row does not exist.
    NotFound(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::NotFound(msg) => write!(f, "Not found: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound(err.to_string()),
            _ => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// Append-only transaction log behind the ledger engine.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Append one entry. The store assigns `id` and `created_at`; existing
    /// entries are never updated or deleted.
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError>;

    /// All entries for a user, in any order, bounded by `cap`.
    async fn query_by_user(
        &self,
        user_id: &UserId,
        cap: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}

/// Promotion lookup and the reserved seasonal-override row.
#[async_trait]
pub trait PromotionStore: Send + Sync {
    /// Promotions whose window contains `now` and whose active flag is set.
    async fn query_active(&self, now: TimeMs) -> Result<Vec<Promotion>, StoreError>;

    /// Write (or replace) the single seasonal override, open-ended from
    /// `now` until deactivated.
    async fn upsert_seasonal(&self, multiplier: Decimal, now: TimeMs) -> Result<(), StoreError>;

    /// Clear the seasonal override's active flag. No-op if none exists.
    async fn deactivate_seasonal(&self) -> Result<(), StoreError>;
}

/// Per-session cart state. The engine never holds items itself.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Current items for a session, in insertion order.
    async fn items(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError>;

    /// Insert an item, or replace it when the id already exists. A zero
    /// quantity removes the item instead.
    async fn upsert_item(&self, session: &SessionId, item: CartItem) -> Result<(), StoreError>;

    /// Switch an item's fulfillment method and its derived shipping cost
    /// and delivery label.
    async fn set_fulfillment(
        &self,
        session: &SessionId,
        item_id: &str,
        method: FulfillmentMethod,
        shipping_cost: Decimal,
        estimated_delivery: &str,
    ) -> Result<CartItem, StoreError>;

    /// Remove an item from the session's cart.
    async fn remove_item(&self, session: &SessionId, item_id: &str) -> Result<(), StoreError>;
}
