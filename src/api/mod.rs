pub mod balance;
pub mod cart;
pub mod earn;
pub mod health;
pub mod seasonal;

use crate::config::Config;
use crate::engine::LedgerEngine;
use crate::store::CartStore;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<LedgerEngine>,
    pub carts: Arc<dyn CartStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(ledger: Arc<LedgerEngine>, carts: Arc<dyn CartStore>, config: Config) -> Self {
        Self {
            ledger,
            carts,
            config,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/loyalty/balance/:user_id", get(balance::get_balance))
        .route("/v1/loyalty/earn/preview", post(earn::preview_earn))
        .route("/v1/loyalty/earn", post(earn::record_earn))
        .route(
            "/v1/loyalty/seasonal",
            post(seasonal::activate).delete(seasonal::deactivate),
        )
        .route("/v1/cart/:session", get(cart::get_cart))
        .route("/v1/cart/:session/items", post(cart::add_item))
        .route(
            "/v1/cart/:session/items/:item_id",
            delete(cart::remove_item),
        )
        .route(
            "/v1/cart/:session/items/:item_id/fulfillment",
            patch(cart::update_fulfillment),
        )
        .route(
            "/v1/cart/:session/fulfillment-groups",
            get(cart::get_fulfillment_groups),
        )
        .layer(cors)
        .with_state(state)
}
