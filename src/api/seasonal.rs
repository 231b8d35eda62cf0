use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use crate::api::AppState;
use crate::domain::Decimal;
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalRequest {
    pub multiplier: Decimal,
}

/// Write the reserved seasonal promotion row. Durable, unlike the original
/// platform's process-global flag.
pub async fn activate(
    State(state): State<AppState>,
    Json(req): Json<SeasonalRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.ledger.activate_seasonal(req.multiplier).await?;
    Ok(Json(serde_json::json!({
        "active": true,
        "multiplier": req.multiplier,
    })))
}

pub async fn deactivate(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.ledger.deactivate_seasonal().await?;
    Ok(Json(serde_json::json!({ "active": false })))
}
