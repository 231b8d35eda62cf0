//! Pure computation engines for loyalty and fulfillment logic.

pub mod fulfillment;
pub mod ledger;

pub use fulfillment::{cart_totals, fulfillment_groups, terms_for, CartTotals, FulfillmentTerms};
pub use ledger::{
    effective_multiplier, LedgerEngine, LedgerError, LedgerSettings, MultiplierPolicy,
};
