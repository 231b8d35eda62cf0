//! In-memory store for testing without a database.

use super::{CartStore, PromotionStore, StoreError, TransactionStore};
use crate::domain::{
    CartItem, Decimal, FulfillmentMethod, LedgerEntry, NewLedgerEntry, Promotion, PromotionKind,
    SessionId, TimeMs, UserId,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory store implementing all three store traits.
///
/// Supports a failure toggle so engine tests can exercise the degraded
/// read paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<Vec<LedgerEntry>>,
    promotions: Mutex<Vec<Promotion>>,
    carts: Mutex<HashMap<SessionId, Vec<CartItem>>>,
    fail_reads: AtomicBool,
    next_id: Mutex<i64>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1),
            ..Self::default()
        }
    }

    /// Seed a promotion.
    pub fn with_promotion(self, promotion: Promotion) -> Self {
        self.promotions
            .lock()
            .expect("promotion lock poisoned")
            .push(promotion);
        self
    }

    /// Seed cart items for a session.
    pub fn with_cart(self, session: SessionId, items: Vec<CartItem>) -> Self {
        self.carts
            .lock()
            .expect("cart lock poisoned")
            .insert(session, items);
        self
    }

    /// Make every read operation fail until cleared.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Number of ledger entries held, across all users.
    pub fn entry_count(&self) -> usize {
        self.entries.lock().expect("entry lock poisoned").len()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated outage".to_string()));
        }
        Ok(())
    }

    fn take_id(&self) -> i64 {
        let mut next = self.next_id.lock().expect("id lock poisoned");
        let id = *next;
        *next += 1;
        id
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let stored = LedgerEntry {
            id: self.take_id(),
            user_id: entry.user_id,
            retailer_id: entry.retailer_id,
            order_id: entry.order_id,
            delta: entry.delta,
            reason: entry.reason,
            created_at: TimeMs::now(),
        };
        self.entries
            .lock()
            .expect("entry lock poisoned")
            .push(stored.clone());
        Ok(stored)
    }

    async fn query_by_user(
        &self,
        user_id: &UserId,
        cap: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.check_reads()?;
        Ok(self
            .entries
            .lock()
            .expect("entry lock poisoned")
            .iter()
            .filter(|e| e.user_id.as_ref() == Some(user_id))
            .take(cap as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PromotionStore for MemoryStore {
    async fn query_active(&self, now: TimeMs) -> Result<Vec<Promotion>, StoreError> {
        self.check_reads()?;
        Ok(self
            .promotions
            .lock()
            .expect("promotion lock poisoned")
            .iter()
            .filter(|p| p.is_active_at(now))
            .cloned()
            .collect())
    }

    async fn upsert_seasonal(&self, multiplier: Decimal, now: TimeMs) -> Result<(), StoreError> {
        let mut promotions = self.promotions.lock().expect("promotion lock poisoned");
        promotions.retain(|p| p.kind != PromotionKind::Seasonal);
        promotions.push(Promotion {
            id: self.take_id(),
            kind: PromotionKind::Seasonal,
            active: true,
            multiplier,
            starts_at: now,
            ends_at: None,
        });
        Ok(())
    }

    async fn deactivate_seasonal(&self) -> Result<(), StoreError> {
        let mut promotions = self.promotions.lock().expect("promotion lock poisoned");
        for promo in promotions
            .iter_mut()
            .filter(|p| p.kind == PromotionKind::Seasonal)
        {
            promo.active = false;
        }
        Ok(())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn items(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError> {
        self.check_reads()?;
        Ok(self
            .carts
            .lock()
            .expect("cart lock poisoned")
            .get(session)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_item(&self, session: &SessionId, item: CartItem) -> Result<(), StoreError> {
        let mut carts = self.carts.lock().expect("cart lock poisoned");
        let items = carts.entry(session.clone()).or_default();
        if item.quantity == 0 {
            items.retain(|i| i.id != item.id);
            return Ok(());
        }
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => *existing = item,
            None => items.push(item),
        }
        Ok(())
    }

    async fn set_fulfillment(
        &self,
        session: &SessionId,
        item_id: &str,
        method: FulfillmentMethod,
        shipping_cost: Decimal,
        estimated_delivery: &str,
    ) -> Result<CartItem, StoreError> {
        let mut carts = self.carts.lock().expect("cart lock poisoned");
        let items = carts
            .get_mut(session)
            .ok_or_else(|| StoreError::NotFound(format!("cart for session {}", session)))?;
        let item = items
            .iter_mut()
            .find(|i| i.id == item_id)
            .ok_or_else(|| StoreError::NotFound(format!("cart item {}", item_id)))?;
        item.fulfillment_method = method;
        item.shipping_cost = shipping_cost;
        item.estimated_delivery = estimated_delivery.to_string();
        Ok(item.clone())
    }

    async fn remove_item(&self, session: &SessionId, item_id: &str) -> Result<(), StoreError> {
        let mut carts = self.carts.lock().expect("cart lock poisoned");
        if let Some(items) = carts.get_mut(session) {
            items.retain(|i| i.id != item_id);
        }
        Ok(())
    }
}
