//! Admin: 플랫폼 설정
//!
//! - `GET  /api/admin/settings`        setting_key → setting_value 맵
//! - `POST /api/admin/settings`        maintenance_mode / feature_flags upsert
//! - `/api/admin/settings/entries/*`   개별 설정 CRUD

use std::collections::BTreeMap;

use axum::{
    extract::{Extension, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::{
    settings::{settings_map, NewSetting},
    PlatformSetting,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{required, ApiJson, ApiPath, MessageResponse};
use crate::AppState;

pub const MAINTENANCE_MODE_KEY: &str = "maintenance_mode";
pub const FEATURE_FLAGS_KEY: &str = "feature_flags";

#[derive(Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub maintenance_mode: Option<bool>,
    pub feature_flags: Option<Value>,
}

impl SettingsUpdate {
    /// 저장할 (key, value) 목록
    pub fn entries(&self) -> Result<Vec<(&'static str, Value)>, ApiError> {
        let mut entries = Vec::new();
        if let Some(enabled) = self.maintenance_mode {
            entries.push((MAINTENANCE_MODE_KEY, Value::Bool(enabled)));
        }
        if let Some(flags) = &self.feature_flags {
            if !flags.is_object() {
                return Err(ApiError::ValidationError("feature_flags must be a JSON object".to_string()));
            }
            entries.push((FEATURE_FLAGS_KEY, flags.clone()));
        }
        if entries.is_empty() {
            return Err(ApiError::BadRequest("No valid updates provided".to_string()));
        }
        Ok(entries)
    }
}

#[derive(Debug, Deserialize)]
pub struct SettingValue {
    pub setting_value: Value,
}

/// GET /api/admin/settings
pub async fn get_settings(State(state): State<AppState>) -> Result<Json<BTreeMap<String, Value>>, ApiError> {
    let settings = state.db.list_settings().await?;
    Ok(Json(settings_map(settings)))
}

/// POST /api/admin/settings
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(update): ApiJson<SettingsUpdate>,
) -> Result<Json<MessageResponse>, ApiError> {
    let entries = update.entries()?;

    for (key, value) in &entries {
        state.db.upsert_setting(key, value, Some(ctx.user.id)).await?;
    }

    let details = json!({
        "maintenance_mode": update.maintenance_mode,
        "feature_flags": update.feature_flags,
    });
    super::audit(&state, &ctx, "update_settings", "settings", "platform", details).await;
    tracing::info!(admin_id = %ctx.user.id, keys = entries.len(), "Platform settings updated");

    Ok(Json(MessageResponse::ok("Settings updated")))
}

/// GET /api/admin/settings/entries
pub async fn list_settings(State(state): State<AppState>) -> Result<Json<Vec<PlatformSetting>>, ApiError> {
    Ok(Json(state.db.list_settings().await?))
}

/// POST /api/admin/settings/entries
pub async fn create_setting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewSetting>,
) -> Result<Json<PlatformSetting>, ApiError> {
    if required(Some(input.setting_key.as_str())).is_none() {
        return Err(ApiError::BadRequest("setting_key is required".to_string()));
    }
    let setting = state.db.create_setting(&input).await?;
    super::audit(&state, &ctx, "create_setting", "setting", &setting.setting_key, Value::Null).await;
    Ok(Json(setting))
}

/// GET /api/admin/settings/entries/:key
pub async fn get_setting(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<PlatformSetting>, ApiError> {
    Ok(Json(state.db.get_setting(&key).await?))
}

/// PUT /api/admin/settings/entries/:key
pub async fn update_setting(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(key): ApiPath<String>,
    ApiJson(req): ApiJson<SettingValue>,
) -> Result<Json<PlatformSetting>, ApiError> {
    let setting = state
        .db
        .update_setting(&key, &req.setting_value, Some(ctx.user.id))
        .await?;
    super::audit(&state, &ctx, "update_setting", "setting", &key, Value::Null).await;
    Ok(Json(setting))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_entries() {
        let update = SettingsUpdate {
            maintenance_mode: Some(true),
            feature_flags: Some(json!({ "nft": false })),
        };
        let entries = update.entries().unwrap();
        assert_eq!(
            entries,
            vec![
                (MAINTENANCE_MODE_KEY, Value::Bool(true)),
                (FEATURE_FLAGS_KEY, json!({ "nft": false })),
            ]
        );
    }

    #[test]
    fn test_settings_entries_validation() {
        assert!(SettingsUpdate::default().entries().is_err());

        let update = SettingsUpdate {
            maintenance_mode: None,
            feature_flags: Some(json!("on")),
        };
        assert!(update.entries().is_err());
    }
}
