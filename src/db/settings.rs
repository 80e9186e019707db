//! 플랫폼 설정 (`platform_settings`)

use std::collections::BTreeMap;

use anyhow::Result;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use super::{Database, PlatformSetting};
use crate::types::SettingType;

#[derive(Debug, Clone, Deserialize)]
pub struct NewSetting {
    pub setting_key: String,
    pub setting_value: Value,
    pub setting_type: SettingType,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

/// 관리자 설정 화면 응답: setting_key → setting_value
pub fn settings_map(settings: Vec<PlatformSetting>) -> BTreeMap<String, Value> {
    settings
        .into_iter()
        .map(|s| (s.setting_key, s.setting_value))
        .collect()
}

impl Database {
    pub async fn list_settings(&self) -> Result<Vec<PlatformSetting>> {
        let settings = sqlx::query_as::<_, PlatformSetting>(
            "SELECT * FROM platform_settings ORDER BY setting_key",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(settings)
    }

    pub async fn get_setting(&self, key: &str) -> Result<PlatformSetting> {
        let setting = sqlx::query_as::<_, PlatformSetting>(
            "SELECT * FROM platform_settings WHERE setting_key = $1",
        )
        .bind(key)
        .fetch_one(self.pool())
        .await?;
        Ok(setting)
    }

    pub async fn create_setting(&self, input: &NewSetting) -> Result<PlatformSetting> {
        let setting = sqlx::query_as::<_, PlatformSetting>(
            r#"
            INSERT INTO platform_settings (setting_key, setting_value, setting_type, description, is_public)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&input.setting_key)
        .bind(&input.setting_value)
        .bind(input.setting_type.as_str())
        .bind(&input.description)
        .bind(input.is_public)
        .fetch_one(self.pool())
        .await?;
        Ok(setting)
    }

    pub async fn update_setting(&self, key: &str, value: &Value, updated_by: Option<Uuid>) -> Result<PlatformSetting> {
        let setting = sqlx::query_as::<_, PlatformSetting>(
            r#"
            UPDATE platform_settings SET setting_value = $2, updated_by = $3, updated_at = NOW()
            WHERE setting_key = $1
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(self.pool())
        .await?;
        Ok(setting)
    }

    /// 관리자 설정 저장 (없으면 생성, setting_type json)
    pub async fn upsert_setting(&self, key: &str, value: &Value, updated_by: Option<Uuid>) -> Result<PlatformSetting> {
        let setting = sqlx::query_as::<_, PlatformSetting>(
            r#"
            INSERT INTO platform_settings (setting_key, setting_value, updated_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (setting_key)
            DO UPDATE SET setting_value = EXCLUDED.setting_value,
                          updated_by = EXCLUDED.updated_by,
                          updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(updated_by)
        .fetch_one(self.pool())
        .await?;
        Ok(setting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn setting(key: &str, value: Value) -> PlatformSetting {
        PlatformSetting {
            id: Uuid::new_v4(),
            setting_key: key.to_string(),
            setting_value: value,
            setting_type: "json".to_string(),
            description: None,
            is_public: false,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_settings_map() {
        let map = settings_map(vec![
            setting("maintenance_mode", json!(false)),
            setting("feature_flags", json!({"nft": true})),
        ]);
        assert_eq!(map.len(), 2);
        assert_eq!(map["maintenance_mode"], json!(false));
        assert_eq!(map["feature_flags"]["nft"], json!(true));
    }

    #[test]
    fn test_new_setting_type_names() {
        let input: NewSetting = serde_json::from_str(
            r#"{"setting_key":"site_name","setting_value":"Agentic","setting_type":"string"}"#,
        )
        .unwrap();
        assert_eq!(input.setting_type, SettingType::Text);
        assert!(!input.is_public);
    }
}
