//! Admin: API key + SDK 설정
//!
//! 평문 키는 생성 응답에서 한 번만 노출. DB에는 해시와 prefix만 저장

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    sdk::{NewApiKey, SdkConfigUpdate},
    ApiKey, SdkConfig,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, required, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::services::api_keys::generate_api_key;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ApiKeyListQuery {
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CreatedApiKey {
    #[serde(flatten)]
    pub api_key: ApiKey,
    /// 평문 키 (다시 조회할 수 없음)
    pub key: String,
}

#[derive(Debug, Deserialize)]
pub struct RateLimitsRequest {
    pub rate_limits: Value,
}

#[derive(Debug, Deserialize)]
pub struct BillingConfigRequest {
    pub billing_config: Value,
}

fn require_object(value: &Value, field: &str) -> Result<(), ApiError> {
    if value.is_object() {
        Ok(())
    } else {
        Err(ApiError::ValidationError(format!("{} must be a JSON object", field)))
    }
}

// ============ API Keys ============

/// GET /api/admin/sdk/keys?user_id=
pub async fn list_api_keys(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ApiKeyListQuery>,
) -> Result<Json<Vec<ApiKey>>, ApiError> {
    Ok(Json(state.db.list_api_keys(query.user_id).await?))
}

/// POST /api/admin/sdk/keys
pub async fn create_api_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewApiKey>,
) -> Result<Json<CreatedApiKey>, ApiError> {
    if required(Some(input.name.as_str())).is_none() {
        return Err(ApiError::BadRequest("name is required".to_string()));
    }
    require_object(&input.rate_limits, "rate_limits")?;

    let generated = generate_api_key();
    let api_key = state
        .db
        .insert_api_key(&input, &generated.hash, &generated.prefix)
        .await?;

    let details = json!({ "user_id": input.user_id, "prefix": generated.prefix });
    super::audit(&state, &ctx, "create_api_key", "api_key", api_key.id, details).await;
    tracing::info!(key_id = %api_key.id, user_id = %input.user_id, "API key created");

    Ok(Json(CreatedApiKey {
        api_key,
        key: generated.key,
    }))
}

/// POST /api/admin/sdk/keys/:id/revoke
pub async fn revoke_api_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiKey>, ApiError> {
    let api_key = state.db.revoke_api_key(id).await?;
    super::audit(&state, &ctx, "revoke_api_key", "api_key", id, Value::Null).await;
    Ok(Json(api_key))
}

/// DELETE /api/admin/sdk/keys/:id
pub async fn delete_api_key(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let response = deleted(state.db.delete_api_key(id).await?, "API key")?;
    super::audit(&state, &ctx, "delete_api_key", "api_key", id, Value::Null).await;
    Ok(response)
}

/// PUT /api/admin/sdk/keys/:id/rate-limits
pub async fn update_api_key_rate_limits(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<RateLimitsRequest>,
) -> Result<Json<ApiKey>, ApiError> {
    require_object(&req.rate_limits, "rate_limits")?;
    Ok(Json(state.db.update_api_key_rate_limits(id, &req.rate_limits).await?))
}

/// PUT /api/admin/sdk/keys/:id/billing
pub async fn update_api_key_billing(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<BillingConfigRequest>,
) -> Result<Json<ApiKey>, ApiError> {
    require_object(&req.billing_config, "billing_config")?;
    Ok(Json(state.db.update_api_key_billing(id, &req.billing_config).await?))
}

// ============ SDK Configs ============

/// GET /api/admin/sdk/configs
pub async fn list_sdk_configs(State(state): State<AppState>) -> Result<Json<Vec<SdkConfig>>, ApiError> {
    Ok(Json(state.db.list_sdk_configs().await?))
}

/// PUT /api/admin/sdk/configs/:sdk_type
pub async fn update_sdk_config(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(sdk_type): ApiPath<String>,
    ApiJson(update): ApiJson<SdkConfigUpdate>,
) -> Result<Json<SdkConfig>, ApiError> {
    let config = state.db.update_sdk_config(&sdk_type, &update).await?;
    super::audit(&state, &ctx, "update_sdk_config", "sdk_config", &sdk_type, Value::Null).await;
    Ok(Json(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_key_defaults() {
        let input: NewApiKey = serde_json::from_value(json!({
            "user_id": Uuid::nil(),
            "name": "ci",
        }))
        .unwrap();
        assert_eq!(input.scopes, vec!["read".to_string()]);
        assert_eq!(input.rate_limits["requests_per_minute"], 60);
        assert_eq!(input.rate_limits["requests_per_hour"], 1000);
        assert!(input.expires_at.is_none());
    }

    #[test]
    fn test_require_object() {
        assert!(require_object(&json!({ "rpm": 10 }), "rate_limits").is_ok());
        let err = require_object(&json!([1, 2]), "rate_limits").unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: rate_limits must be a JSON object");
    }
}
