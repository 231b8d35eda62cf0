//! Cart item and fulfillment group types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::decimal::Decimal;

/// Grouping sentinel for items without a store reference.
pub const UNKNOWN_STORE: &str = "unknown";
/// Grouping sentinel for items without a mall reference.
pub const NO_MALL: &str = "none";

/// How a cart item reaches the shopper. Closed set; unrecognized method
/// strings are rejected when deserializing rather than coerced to
/// ship-to-me.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FulfillmentMethod {
    #[serde(rename = "ship-to-me")]
    ShipToMe,
    #[serde(rename = "in-store-pickup")]
    InStorePickup,
    #[serde(rename = "ship-to-mall")]
    ShipToMall,
}

impl FulfillmentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentMethod::ShipToMe => "ship-to-me",
            FulfillmentMethod::InStorePickup => "in-store-pickup",
            FulfillmentMethod::ShipToMall => "ship-to-mall",
        }
    }
}

impl Default for FulfillmentMethod {
    fn default() -> Self {
        FulfillmentMethod::ShipToMe
    }
}

impl fmt::Display for FulfillmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FulfillmentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ship-to-me" => Ok(FulfillmentMethod::ShipToMe),
            "in-store-pickup" => Ok(FulfillmentMethod::InStorePickup),
            "ship-to-mall" => Ok(FulfillmentMethod::ShipToMall),
            other => Err(format!("unknown fulfillment method: {}", other)),
        }
    }
}

/// A line in a shopper's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: String,
    pub name: String,
    /// Per-unit price, non-negative.
    pub price: Decimal,
    /// Positive; reaching zero removes the item.
    pub quantity: u32,
    pub store_id: Option<String>,
    pub mall_id: Option<String>,
    #[serde(default)]
    pub fulfillment_method: FulfillmentMethod,
    /// Per-item shipping, derived from the fulfillment method.
    pub shipping_cost: Decimal,
    /// Delivery label, derived from the fulfillment method.
    pub estimated_delivery: String,
}

impl CartItem {
    /// Line total: price x quantity.
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Store reference normalized for grouping.
    pub fn store_key(&self) -> &str {
        self.store_id.as_deref().unwrap_or(UNKNOWN_STORE)
    }

    /// Mall reference normalized for grouping.
    pub fn mall_key(&self) -> &str {
        self.mall_id.as_deref().unwrap_or(NO_MALL)
    }

    /// Composite grouping key: `method-store-mall`.
    pub fn group_key(&self) -> String {
        format!(
            "{}-{}-{}",
            self.fulfillment_method,
            self.store_key(),
            self.mall_key()
        )
    }
}

/// A derived partition of the cart sharing method, store, and mall.
///
/// Pure view over the item list; recomputed on every query and carrying no
/// identity across calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FulfillmentGroup {
    pub key: String,
    pub fulfillment_method: FulfillmentMethod,
    pub store_id: String,
    pub mall_id: String,
    /// Original cart order preserved within the group.
    pub items: Vec<CartItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    /// Taken from the first item encountered in the group.
    pub estimated_delivery: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(store: Option<&str>, mall: Option<&str>) -> CartItem {
        CartItem {
            id: "sku-1".to_string(),
            name: "Candle".to_string(),
            price: Decimal::from_str_canonical("10").unwrap(),
            quantity: 2,
            store_id: store.map(String::from),
            mall_id: mall.map(String::from),
            fulfillment_method: FulfillmentMethod::ShipToMe,
            shipping_cost: Decimal::from_str_canonical("4.99").unwrap(),
            estimated_delivery: "2-5 business days".to_string(),
        }
    }

    #[test]
    fn test_group_key_with_defaults() {
        assert_eq!(item(None, None).group_key(), "ship-to-me-unknown-none");
        assert_eq!(
            item(Some("A"), Some("m1")).group_key(),
            "ship-to-me-A-m1"
        );
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(None, None).line_total().to_canonical_string(), "20");
    }

    #[test]
    fn test_method_serde_rejects_unknown() {
        let parsed: Result<FulfillmentMethod, _> = serde_json::from_str("\"drone-drop\"");
        assert!(parsed.is_err());

        let parsed: FulfillmentMethod = serde_json::from_str("\"in-store-pickup\"").unwrap();
        assert_eq!(parsed, FulfillmentMethod::InStorePickup);
    }

    #[test]
    fn test_method_defaults_to_ship_to_me_when_unset() {
        let json = r#"{
            "id": "sku-2",
            "name": "Mug",
            "price": 5,
            "quantity": 1,
            "storeId": null,
            "mallId": null,
            "shippingCost": 0,
            "estimatedDelivery": ""
        }"#;
        let parsed: CartItem = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.fulfillment_method, FulfillmentMethod::ShipToMe);
    }
}
