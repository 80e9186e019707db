//! Admin: 지갑 커넥터

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{wallets::WalletConnectorUpdate, WalletConnector};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{required, ApiJson, ApiPath};
use crate::AppState;

use super::rpc::validate_rpc_url;

#[derive(Debug, Deserialize)]
pub struct ConnectorRpcRequest {
    pub rpc_endpoint: Option<String>,
    pub fallback_rpc: Option<String>,
}

/// GET /api/admin/wallets
pub async fn list_wallet_connectors(
    State(state): State<AppState>,
) -> Result<Json<Vec<WalletConnector>>, ApiError> {
    Ok(Json(state.db.list_wallet_connectors().await?))
}

/// PUT /api/admin/wallets/:id
pub async fn update_wallet_connector(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<WalletConnectorUpdate>,
) -> Result<Json<WalletConnector>, ApiError> {
    let connector = state.db.update_wallet_connector(id, &update).await?;
    super::audit(&state, &ctx, "update_wallet_connector", "wallet_connector", id, json!({ "enabled": update.enabled })).await;
    Ok(Json(connector))
}

/// PUT /api/admin/wallets/:id/rpc
pub async fn set_rpc_endpoint(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ConnectorRpcRequest>,
) -> Result<Json<WalletConnector>, ApiError> {
    let rpc = required(req.rpc_endpoint.as_deref())
        .ok_or_else(|| ApiError::BadRequest("rpc_endpoint is required".to_string()))?;
    validate_rpc_url(rpc)?;

    let fallback = required(req.fallback_rpc.as_deref());
    if let Some(fallback) = fallback {
        validate_rpc_url(fallback)?;
    }

    let connector = state.db.set_connector_rpc(id, rpc, fallback).await?;
    super::audit(&state, &ctx, "set_wallet_rpc", "wallet_connector", id, Value::Null).await;
    Ok(Json(connector))
}
