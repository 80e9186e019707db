//! Admin: 애드온

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{addons::AddonToggle, Addon, AddonConfig};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{ApiJson, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ConfigureAddonRequest {
    pub user_id: Uuid,
    pub config: Value,
}

#[derive(Debug, Deserialize)]
pub struct AddonConfigQuery {
    pub user_id: Option<Uuid>,
}

/// GET /api/admin/addons
pub async fn list_addons(State(state): State<AppState>) -> Result<Json<Vec<Addon>>, ApiError> {
    Ok(Json(state.db.list_addons().await?))
}

/// POST /api/admin/addons/:id/:action
///
/// action: install | uninstall | enable | disable
pub async fn toggle_addon(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath((id, action)): ApiPath<(Uuid, String)>,
) -> Result<Json<Addon>, ApiError> {
    let toggle = AddonToggle::parse(&action).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Invalid action '{}'. Must be one of: install, uninstall, enable, disable",
            action
        ))
    })?;

    let addon = state.db.toggle_addon(id, toggle).await?;
    super::audit(&state, &ctx, &format!("{}_addon", action), "addon", id, json!({ "name": addon.name })).await;
    tracing::info!(addon_id = %id, action = %action, "Addon toggled");
    Ok(Json(addon))
}

/// PUT /api/admin/addons/:id/config
pub async fn configure_addon(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(addon_id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ConfigureAddonRequest>,
) -> Result<Json<AddonConfig>, ApiError> {
    if !req.config.is_object() {
        return Err(ApiError::ValidationError("config must be a JSON object".to_string()));
    }
    let config = state.db.configure_addon(addon_id, req.user_id, &req.config).await?;
    super::audit(&state, &ctx, "configure_addon", "addon", addon_id, json!({ "user_id": req.user_id })).await;
    Ok(Json(config))
}

/// GET /api/admin/addons/:id/config?user_id=
pub async fn get_addon_config(
    State(state): State<AppState>,
    ApiPath(addon_id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AddonConfigQuery>,
) -> Result<Json<AddonConfig>, ApiError> {
    state
        .db
        .get_addon_config(addon_id, query.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Addon config".to_string()))
}
