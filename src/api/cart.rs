use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::api::AppState;
use crate::domain::{CartItem, Decimal, FulfillmentGroup, FulfillmentMethod, SessionId};
use crate::engine::{cart_totals, fulfillment_groups, terms_for, CartTotals};
use crate::error::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItem>,
    pub groups: Vec<FulfillmentGroup>,
    pub totals: CartTotals,
}

pub async fn get_cart(
    Path(session): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<CartResponse>, AppError> {
    let session = SessionId::new(session);
    let items = state.carts.items(&session).await?;
    let groups = fulfillment_groups(&items);
    let totals = cart_totals(&groups);
    Ok(Json(CartResponse {
        items,
        groups,
        totals,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupsResponse {
    pub groups: Vec<FulfillmentGroup>,
    pub totals: CartTotals,
}

/// Groups are recomputed from the current item list on every call; an
/// empty cart is a valid empty result, not an error.
pub async fn get_fulfillment_groups(
    Path(session): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<GroupsResponse>, AppError> {
    let session = SessionId::new(session);
    let items = state.carts.items(&session).await?;
    let groups = fulfillment_groups(&items);
    let totals = cart_totals(&groups);
    Ok(Json(GroupsResponse { groups, totals }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub id: Option<String>,
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    pub store_id: Option<String>,
    pub mall_id: Option<String>,
    /// Method string, validated against the closed enum. Absent means
    /// ship-to-me.
    pub fulfillment_method: Option<String>,
}

/// Add or replace a cart line. A zero quantity removes any existing item
/// with the same id.
pub async fn add_item(
    Path(session): Path<String>,
    State(state): State<AppState>,
    Json(req): Json<AddItemRequest>,
) -> Result<Json<CartItem>, AppError> {
    if req.price.is_negative() {
        return Err(AppError::InvalidArgument(
            "price must be non-negative".to_string(),
        ));
    }
    let method = match req.fulfillment_method.as_deref() {
        Some(raw) => FulfillmentMethod::from_str(raw).map_err(AppError::InvalidArgument)?,
        None => FulfillmentMethod::default(),
    };
    let terms = terms_for(method, state.config.ship_to_me_fee);

    let item = CartItem {
        id: req.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        name: req.name,
        price: req.price,
        quantity: req.quantity,
        store_id: req.store_id,
        mall_id: req.mall_id,
        fulfillment_method: method,
        shipping_cost: terms.shipping_cost,
        estimated_delivery: terms.estimated_delivery.to_string(),
    };

    let session = SessionId::new(session);
    state.carts.upsert_item(&session, item.clone()).await?;
    Ok(Json(item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFulfillmentRequest {
    pub method: String,
}

/// Switch an item's fulfillment method. Shipping cost and delivery label
/// are derived from the method alone; unknown method strings get a 400
/// instead of the original platform's silent ship-to-me default.
pub async fn update_fulfillment(
    Path((session, item_id)): Path<(String, String)>,
    State(state): State<AppState>,
    Json(req): Json<UpdateFulfillmentRequest>,
) -> Result<Json<CartItem>, AppError> {
    let method = FulfillmentMethod::from_str(&req.method).map_err(AppError::InvalidArgument)?;
    let terms = terms_for(method, state.config.ship_to_me_fee);

    let session = SessionId::new(session);
    let updated = state
        .carts
        .set_fulfillment(
            &session,
            &item_id,
            method,
            terms.shipping_cost,
            terms.estimated_delivery,
        )
        .await?;

    Ok(Json(updated))
}

pub async fn remove_item(
    Path((session, item_id)): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let session = SessionId::new(session);
    state.carts.remove_item(&session, &item_id).await?;
    Ok(Json(serde_json::json!({ "removed": item_id })))
}
