//! Repository layer: SQLite-backed implementations of the store traits.
//!
//! Decimals are stored as canonical strings and re-parsed on read; SQLite's
//! REAL affinity would lose precision for money columns.

use crate::domain::{
    CartItem, Decimal, EarnReason, FulfillmentMethod, LedgerEntry, NewLedgerEntry, Promotion,
    PromotionKind, SessionId, TimeMs, UserId,
};
use crate::store::{CartStore, PromotionStore, StoreError, TransactionStore};
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::warn;

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }
}

fn parse_decimal(raw: &str, column: &str) -> Decimal {
    Decimal::from_str(raw).unwrap_or_else(|e| {
        warn!(column = column, value = %raw, error = %e, "Failed to parse stored decimal, using default");
        Decimal::default()
    })
}

fn entry_from_row(row: &SqliteRow) -> Result<LedgerEntry, StoreError> {
    let reason_str: String = row.get("reason");
    let reason = EarnReason::from_str(&reason_str)
        .map_err(|e| StoreError::Unavailable(format!("corrupt ledger row: {}", e)))?;

    Ok(LedgerEntry {
        id: row.get("id"),
        user_id: row.get::<Option<String>, _>("user_id").map(UserId::new),
        retailer_id: row.get("retailer_id"),
        order_id: row.get("order_id"),
        delta: row.get("delta"),
        reason,
        created_at: TimeMs::new(row.get("created_at_ms")),
    })
}

fn cart_item_from_row(row: &SqliteRow) -> Result<CartItem, StoreError> {
    let method_str: String = row.get("fulfillment_method");
    let fulfillment_method = FulfillmentMethod::from_str(&method_str)
        .map_err(|e| StoreError::Unavailable(format!("corrupt cart row: {}", e)))?;

    let price_str: String = row.get("price");
    let shipping_str: String = row.get("shipping_cost");
    let raw_quantity: i64 = row.get("quantity");
    let quantity = u32::try_from(raw_quantity).unwrap_or_else(|_| {
        warn!(value = raw_quantity, "Stored cart quantity out of range, using 0");
        0
    });

    Ok(CartItem {
        id: row.get("item_id"),
        name: row.get("name"),
        price: parse_decimal(&price_str, "price"),
        quantity,
        store_id: row.get("store_id"),
        mall_id: row.get("mall_id"),
        fulfillment_method,
        shipping_cost: parse_decimal(&shipping_str, "shipping_cost"),
        estimated_delivery: row.get("estimated_delivery"),
    })
}

#[async_trait]
impl TransactionStore for Repository {
    async fn append(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, StoreError> {
        let created_at = TimeMs::now();

        let result = sqlx::query(
            r#"
            INSERT INTO ledger_entries (user_id, retailer_id, order_id, delta, reason, created_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(entry.user_id.as_ref().map(|u| u.as_str().to_string()))
        .bind(&entry.retailer_id)
        .bind(&entry.order_id)
        .bind(entry.delta)
        .bind(entry.reason.as_str())
        .bind(created_at.as_i64())
        .execute(&self.pool)
        .await?;

        Ok(LedgerEntry {
            id: result.last_insert_rowid(),
            user_id: entry.user_id,
            retailer_id: entry.retailer_id,
            order_id: entry.order_id,
            delta: entry.delta,
            reason: entry.reason,
            created_at,
        })
    }

    async fn query_by_user(
        &self,
        user_id: &UserId,
        cap: u32,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, retailer_id, order_id, delta, reason, created_at_ms
            FROM ledger_entries
            WHERE user_id = ?
            ORDER BY created_at_ms ASC, id ASC
            LIMIT ?
            "#,
        )
        .bind(user_id.as_str())
        .bind(i64::from(cap))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(entry_from_row).collect()
    }
}

#[async_trait]
impl PromotionStore for Repository {
    async fn query_active(&self, now: TimeMs) -> Result<Vec<Promotion>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, kind, active, multiplier, starts_at_ms, ends_at_ms
            FROM promotions
            WHERE active = 1
              AND starts_at_ms <= ?
              AND (ends_at_ms IS NULL OR ends_at_ms >= ?)
            ORDER BY id ASC
            "#,
        )
        .bind(now.as_i64())
        .bind(now.as_i64())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let kind_str: String = row.get("kind");
                let kind = PromotionKind::from_str(&kind_str)
                    .map_err(|e| StoreError::Unavailable(format!("corrupt promotion row: {}", e)))?;
                let multiplier_str: String = row.get("multiplier");
                let active: i64 = row.get("active");

                Ok(Promotion {
                    id: row.get("id"),
                    kind,
                    active: active != 0,
                    multiplier: parse_decimal(&multiplier_str, "multiplier"),
                    starts_at: TimeMs::new(row.get("starts_at_ms")),
                    ends_at: row.get::<Option<i64>, _>("ends_at_ms").map(TimeMs::new),
                })
            })
            .collect()
    }

    async fn upsert_seasonal(&self, multiplier: Decimal, now: TimeMs) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        sqlx::query("UPDATE promotions SET active = 0 WHERE kind = 'seasonal'")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO promotions (kind, active, multiplier, starts_at_ms, ends_at_ms)
            VALUES ('seasonal', 1, ?, ?, NULL)
            "#,
        )
        .bind(multiplier.to_canonical_string())
        .bind(now.as_i64())
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(StoreError::from)?;
        Ok(())
    }

    async fn deactivate_seasonal(&self) -> Result<(), StoreError> {
        sqlx::query("UPDATE promotions SET active = 0 WHERE kind = 'seasonal'")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl CartStore for Repository {
    async fn items(&self, session: &SessionId) -> Result<Vec<CartItem>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT item_id, name, price, quantity, store_id, mall_id,
                   fulfillment_method, shipping_cost, estimated_delivery
            FROM cart_items
            WHERE session_id = ?
            ORDER BY added_at_ms ASC, item_id ASC
            "#,
        )
        .bind(session.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(cart_item_from_row).collect()
    }

    async fn upsert_item(&self, session: &SessionId, item: CartItem) -> Result<(), StoreError> {
        if item.quantity == 0 {
            sqlx::query("DELETE FROM cart_items WHERE session_id = ? AND item_id = ?")
                .bind(session.as_str())
                .bind(&item.id)
                .execute(&self.pool)
                .await?;
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items
                (session_id, item_id, name, price, quantity, store_id, mall_id,
                 fulfillment_method, shipping_cost, estimated_delivery, added_at_ms)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id, item_id) DO UPDATE SET
                name = excluded.name,
                price = excluded.price,
                quantity = excluded.quantity,
                store_id = excluded.store_id,
                mall_id = excluded.mall_id,
                fulfillment_method = excluded.fulfillment_method,
                shipping_cost = excluded.shipping_cost,
                estimated_delivery = excluded.estimated_delivery
            "#,
        )
        .bind(session.as_str())
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price.to_canonical_string())
        .bind(i64::from(item.quantity))
        .bind(&item.store_id)
        .bind(&item.mall_id)
        .bind(item.fulfillment_method.as_str())
        .bind(item.shipping_cost.to_canonical_string())
        .bind(&item.estimated_delivery)
        .bind(TimeMs::now().as_i64())
        .execute(&self.pool)
        .await?;

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
        let result = sqlx::query(
            r#"
            UPDATE cart_items
            SET fulfillment_method = ?, shipping_cost = ?, estimated_delivery = ?
            WHERE session_id = ? AND item_id = ?
            "#,
        )
        .bind(method.as_str())
        .bind(shipping_cost.to_canonical_string())
        .bind(estimated_delivery)
        .bind(session.as_str())
        .bind(item_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("cart item {}", item_id)));
        }

        let row = sqlx::query(
            r#"
            SELECT item_id, name, price, quantity, store_id, mall_id,
                   fulfillment_method, shipping_cost, estimated_delivery
            FROM cart_items
            WHERE session_id = ? AND item_id = ?
            "#,
        )
        .bind(session.as_str())
        .bind(item_id)
        .fetch_one(&self.pool)
        .await?;

        cart_item_from_row(&row)
    }

    async fn remove_item(&self, session: &SessionId, item_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cart_items WHERE session_id = ? AND item_id = ?")
            .bind(session.as_str())
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
