pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod store;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    BalanceSummary, CartItem, Decimal, EarnReason, FulfillmentGroup, FulfillmentMethod,
    LedgerEntry, Promotion, PromotionKind, SessionId, TimeMs, UserId,
};
pub use engine::{LedgerEngine, LedgerSettings, MultiplierPolicy};
pub use error::AppError;
pub use store::{CartStore, MemoryStore, PromotionStore, StoreError, TransactionStore};
