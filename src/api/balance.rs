use axum::extract::{Path, State};
use axum::Json;

use crate::api::AppState;
use crate::domain::{BalanceSummary, UserId};
use crate::error::AppError;

/// A balance query never fails from the caller's perspective; storage
/// trouble degrades to defaults inside the engine.
pub async fn get_balance(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalanceSummary>, AppError> {
    let trimmed = user_id.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(
            "userId must be a non-empty identifier".to_string(),
        ));
    }

    let summary = state.ledger.balance(&UserId::new(trimmed.to_string())).await;
    Ok(Json(summary))
}
