//! Admin: 수수료 + 오버라이드

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::db::{
    fees::{FeeOverrideFilter, FeeUpdate, OverrideTarget},
    Fee, FeeOverride,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::types::FeeType;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct FeeOverrideRequest {
    pub fee_type: FeeType,
    pub amount: f64,
    pub percentage: Option<f64>,
}

/// GET /api/admin/fees
pub async fn list_fees(State(state): State<AppState>) -> Result<Json<Vec<Fee>>, ApiError> {
    Ok(Json(state.db.list_fees().await?))
}

/// PUT /api/admin/fees/:fee_type
pub async fn update_fee(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(fee_type): ApiPath<FeeType>,
    ApiJson(update): ApiJson<FeeUpdate>,
) -> Result<Json<Fee>, ApiError> {
    let fee = state.db.update_fee(fee_type, &update).await?;
    let details = json!({ "amount": update.amount, "percentage": update.percentage, "active": update.active });
    super::audit(&state, &ctx, "update_fee", "fee", fee_type, details).await;
    Ok(Json(fee))
}

/// GET /api/admin/fees/overrides?agent_id=&user_id=
pub async fn list_fee_overrides(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<FeeOverrideFilter>,
) -> Result<Json<Vec<FeeOverride>>, ApiError> {
    Ok(Json(state.db.list_fee_overrides(filter).await?))
}

/// PUT /api/admin/fees/overrides/agent/:id
pub async fn set_agent_fee_override(
    state: State<AppState>,
    ctx: Extension<AdminContext>,
    ApiPath(agent_id): ApiPath<Uuid>,
    req: ApiJson<FeeOverrideRequest>,
) -> Result<Json<FeeOverride>, ApiError> {
    set_override(state, ctx, OverrideTarget::Agent(agent_id), req).await
}

/// PUT /api/admin/fees/overrides/user/:id
pub async fn set_user_fee_override(
    state: State<AppState>,
    ctx: Extension<AdminContext>,
    ApiPath(user_id): ApiPath<Uuid>,
    req: ApiJson<FeeOverrideRequest>,
) -> Result<Json<FeeOverride>, ApiError> {
    set_override(state, ctx, OverrideTarget::User(user_id), req).await
}

/// DELETE /api/admin/fees/overrides/:id
pub async fn delete_fee_override(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = deleted(state.db.delete_fee_override(id).await?, "Fee override")?;
    super::audit(&state, &ctx, "delete_fee_override", "fee_override", id, serde_json::Value::Null).await;
    Ok(response)
}

async fn set_override(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    target: OverrideTarget,
    ApiJson(req): ApiJson<FeeOverrideRequest>,
) -> Result<Json<FeeOverride>, ApiError> {
    if req.amount < 0.0 {
        return Err(ApiError::ValidationError("amount must not be negative".to_string()));
    }

    let fee_override = state
        .db
        .set_fee_override(target, req.fee_type, req.amount, req.percentage)
        .await?;

    let details = json!({ "target": format!("{:?}", target), "fee_type": req.fee_type, "amount": req.amount });
    super::audit(&state, &ctx, "set_fee_override", "fee_override", fee_override.id, details).await;
    Ok(Json(fee_override))
}
