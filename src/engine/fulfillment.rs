//! Fulfillment grouping engine: partitions a flat cart into delivery
//! groups and derives per-method shipping terms.
//!
//! Groups are a pure projection of the current item list. They are
//! recomputed on every access and never persisted, so they cannot drift
//! from the underlying cart.

use crate::domain::{CartItem, Decimal, FulfillmentGroup, FulfillmentMethod};
use serde::Serialize;

/// Shipping cost and delivery label for one fulfillment method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FulfillmentTerms {
    pub shipping_cost: Decimal,
    pub estimated_delivery: &'static str,
}

/// Total lookup over the three-variant method enum. Pickup methods ship
/// free; ship-to-me carries the configured flat fee.
pub fn terms_for(method: FulfillmentMethod, ship_to_me_fee: Decimal) -> FulfillmentTerms {
    match method {
        FulfillmentMethod::InStorePickup => FulfillmentTerms {
            shipping_cost: Decimal::zero(),
            estimated_delivery: "ready today",
        },
        FulfillmentMethod::ShipToMall => FulfillmentTerms {
            shipping_cost: Decimal::zero(),
            estimated_delivery: "2-3 days",
        },
        FulfillmentMethod::ShipToMe => FulfillmentTerms {
            shipping_cost: ship_to_me_fee,
            estimated_delivery: "2-5 business days",
        },
    }
}

/// Partition items into groups keyed by (method, store, mall).
///
/// Groups appear in first-seen order and each keeps its items in original
/// cart order. Every input item lands in exactly one group; an empty cart
/// yields an empty list.
pub fn fulfillment_groups(items: &[CartItem]) -> Vec<FulfillmentGroup> {
    let mut groups: Vec<FulfillmentGroup> = Vec::new();

    for item in items {
        let key = item.group_key();
        let idx = match groups.iter().position(|g| g.key == key) {
            Some(idx) => idx,
            None => {
                groups.push(FulfillmentGroup {
                    key,
                    fulfillment_method: item.fulfillment_method,
                    store_id: item.store_key().to_string(),
                    mall_id: item.mall_key().to_string(),
                    items: Vec::new(),
                    subtotal: Decimal::zero(),
                    shipping_cost: Decimal::zero(),
                    estimated_delivery: item.estimated_delivery.clone(),
                });
                groups.len() - 1
            }
        };

        let group = &mut groups[idx];
        group.subtotal = group.subtotal + item.line_total();
        group.shipping_cost = group.shipping_cost + item.shipping_cost;
        group.items.push(item.clone());
    }

    groups
}

/// Grand totals across all groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub item_count: u32,
}

pub fn cart_totals(groups: &[FulfillmentGroup]) -> CartTotals {
    let mut subtotal = Decimal::zero();
    let mut shipping_cost = Decimal::zero();
    let mut item_count = 0u32;

    for group in groups {
        subtotal = subtotal + group.subtotal;
        shipping_cost = shipping_cost + group.shipping_cost;
        item_count += group.items.iter().map(|i| i.quantity).sum::<u32>();
    }

    CartTotals {
        subtotal,
        shipping_cost,
        total: subtotal + shipping_cost,
        item_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn item(
        id: &str,
        price: &str,
        quantity: u32,
        method: FulfillmentMethod,
        store: Option<&str>,
        shipping: &str,
    ) -> CartItem {
        let terms = terms_for(method, dec("4.99"));
        CartItem {
            id: id.to_string(),
            name: format!("item {}", id),
            price: dec(price),
            quantity,
            store_id: store.map(String::from),
            mall_id: None,
            fulfillment_method: method,
            shipping_cost: dec(shipping),
            estimated_delivery: terms.estimated_delivery.to_string(),
        }
    }

    #[test]
    fn test_terms_lookup_table() {
        let pickup = terms_for(FulfillmentMethod::InStorePickup, dec("4.99"));
        assert_eq!(pickup.shipping_cost, Decimal::zero());
        assert_eq!(pickup.estimated_delivery, "ready today");

        let mall = terms_for(FulfillmentMethod::ShipToMall, dec("4.99"));
        assert_eq!(mall.shipping_cost, Decimal::zero());
        assert_eq!(mall.estimated_delivery, "2-3 days");

        let home = terms_for(FulfillmentMethod::ShipToMe, dec("4.99"));
        assert_eq!(home.shipping_cost, dec("4.99"));
        assert_eq!(home.estimated_delivery, "2-5 business days");
    }

    #[test]
    fn test_empty_cart_yields_no_groups() {
        assert!(fulfillment_groups(&[]).is_empty());
    }

    #[test]
    fn test_two_method_cart_splits_into_two_groups() {
        let items = vec![
            item("1", "10", 2, FulfillmentMethod::ShipToMe, None, "4.99"),
            item("2", "5", 1, FulfillmentMethod::InStorePickup, Some("A"), "0"),
        ];

        let groups = fulfillment_groups(&items);
        assert_eq!(groups.len(), 2);

        assert_eq!(groups[0].subtotal, dec("20"));
        assert_eq!(groups[0].shipping_cost, dec("4.99"));
        assert_eq!(groups[0].store_id, "unknown");

        assert_eq!(groups[1].subtotal, dec("5"));
        assert_eq!(groups[1].shipping_cost, Decimal::zero());
        assert_eq!(groups[1].store_id, "A");
    }

    #[test]
    fn test_partition_no_item_lost_or_duplicated() {
        let items = vec![
            item("1", "10", 1, FulfillmentMethod::ShipToMe, Some("A"), "4.99"),
            item("2", "4", 1, FulfillmentMethod::InStorePickup, Some("A"), "0"),
            item("3", "7", 3, FulfillmentMethod::ShipToMe, Some("A"), "4.99"),
            item("4", "2", 1, FulfillmentMethod::ShipToMall, Some("B"), "0"),
            item("5", "9", 2, FulfillmentMethod::ShipToMe, Some("B"), "4.99"),
        ];

        let groups = fulfillment_groups(&items);
        let mut seen: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.items.iter().map(|i| i.id.as_str()))
            .collect();
        assert_eq!(seen.len(), items.len());
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), items.len());
    }

    #[test]
    fn test_groups_in_first_seen_order_items_in_cart_order() {
        let items = vec![
            item("1", "10", 1, FulfillmentMethod::ShipToMe, Some("A"), "4.99"),
            item("2", "4", 1, FulfillmentMethod::InStorePickup, Some("B"), "0"),
            item("3", "7", 1, FulfillmentMethod::ShipToMe, Some("A"), "4.99"),
        ];

        let groups = fulfillment_groups(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].fulfillment_method, FulfillmentMethod::ShipToMe);
        let ids: Vec<&str> = groups[0].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let items = vec![
            item("1", "10", 2, FulfillmentMethod::ShipToMe, None, "4.99"),
            item("2", "5", 1, FulfillmentMethod::InStorePickup, Some("A"), "0"),
        ];
        let first = fulfillment_groups(&items);
        let second = fulfillment_groups(&items);
        assert_eq!(first, second);
    }

    #[test]
    fn test_delivery_estimate_comes_from_first_item() {
        let mut late = item("2", "5", 1, FulfillmentMethod::ShipToMe, Some("A"), "4.99");
        late.estimated_delivery = "next week".to_string();
        let items = vec![
            item("1", "10", 1, FulfillmentMethod::ShipToMe, Some("A"), "4.99"),
            late,
        ];

        let groups = fulfillment_groups(&items);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].estimated_delivery, "2-5 business days");
    }

    #[test]
    fn test_cart_totals() {
        let items = vec![
            item("1", "10", 2, FulfillmentMethod::ShipToMe, None, "4.99"),
            item("2", "5", 1, FulfillmentMethod::InStorePickup, Some("A"), "0"),
        ];
        let totals = cart_totals(&fulfillment_groups(&items));
        assert_eq!(totals.subtotal, dec("25"));
        assert_eq!(totals.shipping_cost, dec("4.99"));
        assert_eq!(totals.total, dec("29.99"));
        assert_eq!(totals.item_count, 3);
    }
}
