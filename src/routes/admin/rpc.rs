//! Admin: RPC 엔드포인트
//!
//! health check 는 저장된 URL에 `getHealth` 한 번 호출 후 결과를 기록

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    rpc::{NewRpcEndpoint, RpcEndpointUpdate},
    RpcEndpoint,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, required, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::types::{text_filter, HealthStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RpcListQuery {
    pub network: Option<String>,
}

/// http(s)/ws(s) URL 만 허용
pub fn validate_rpc_url(url: &str) -> Result<(), ApiError> {
    let valid = ["http://", "https://", "ws://", "wss://"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len());
    if valid {
        Ok(())
    } else {
        Err(ApiError::ValidationError(format!("Invalid RPC url: {}", url)))
    }
}

/// GET /api/admin/rpc?network=
pub async fn list_rpc_endpoints(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<RpcListQuery>,
) -> Result<Json<Vec<RpcEndpoint>>, ApiError> {
    let network = text_filter(query.network.as_deref());
    Ok(Json(state.db.list_rpc_endpoints(network).await?))
}

/// POST /api/admin/rpc
pub async fn create_rpc(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewRpcEndpoint>,
) -> Result<Json<RpcEndpoint>, ApiError> {
    if required(Some(input.name.as_str())).is_none() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    validate_rpc_url(&input.url)?;

    let endpoint = state.db.create_rpc_endpoint(&input).await?;
    super::audit(&state, &ctx, "create_rpc", "rpc_endpoint", endpoint.id, json!({ "network": endpoint.network })).await;
    Ok(Json(endpoint))
}

/// PUT /api/admin/rpc/:id
pub async fn update_rpc(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<RpcEndpointUpdate>,
) -> Result<Json<RpcEndpoint>, ApiError> {
    if let Some(url) = &update.url {
        validate_rpc_url(url)?;
    }
    let endpoint = state.db.update_rpc_endpoint(id, &update).await?;
    super::audit(&state, &ctx, "update_rpc", "rpc_endpoint", id, Value::Null).await;
    Ok(Json(endpoint))
}

/// DELETE /api/admin/rpc/:id
pub async fn delete_rpc(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = deleted(state.db.delete_rpc_endpoint(id).await?, "RPC endpoint")?;
    super::audit(&state, &ctx, "delete_rpc", "rpc_endpoint", id, Value::Null).await;
    Ok(response)
}

/// POST /api/admin/rpc/:id/health
pub async fn check_rpc_health(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<RpcEndpoint>, ApiError> {
    let endpoint = state.db.get_rpc_endpoint(id).await?;

    let status = if state.solana.check_health(&endpoint.url).await {
        HealthStatus::Healthy
    } else {
        HealthStatus::Unhealthy
    };
    tracing::info!(rpc_id = %id, status = %status, "RPC health checked");

    Ok(Json(state.db.record_rpc_health(id, status).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rpc_url() {
        assert!(validate_rpc_url("https://api.mainnet-beta.solana.com").is_ok());
        assert!(validate_rpc_url("wss://api.devnet.solana.com").is_ok());
        assert!(validate_rpc_url("https://").is_err());
        assert!(validate_rpc_url("ftp://example.com").is_err());
        assert!(validate_rpc_url("").is_err());
    }
}
