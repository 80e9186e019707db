//! 애드온 + 사용자별 애드온 설정

use anyhow::Result;
use serde_json::Value;
use uuid::Uuid;

use super::{Addon, AddonConfig, Database};

/// 애드온 상태 토글 (한 번에 boolean 컬럼 하나만 변경)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonToggle {
    Install,
    Uninstall,
    Enable,
    Disable,
}

impl AddonToggle {
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "install" => Some(Self::Install),
            "uninstall" => Some(Self::Uninstall),
            "enable" => Some(Self::Enable),
            "disable" => Some(Self::Disable),
            _ => None,
        }
    }

    /// (컬럼, 값)
    fn assignment(&self) -> (&'static str, bool) {
        match self {
            Self::Install => ("installed", true),
            Self::Uninstall => ("installed", false),
            Self::Enable => ("enabled", true),
            Self::Disable => ("enabled", false),
        }
    }

    pub(crate) fn sql(&self) -> String {
        let (column, _) = self.assignment();
        format!("UPDATE addons SET {column} = $2, updated_at = NOW() WHERE id = $1 RETURNING *")
    }
}

impl Database {
    pub async fn list_addons(&self) -> Result<Vec<Addon>> {
        let addons = sqlx::query_as::<_, Addon>("SELECT * FROM addons ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(addons)
    }

    pub async fn toggle_addon(&self, id: Uuid, toggle: AddonToggle) -> Result<Addon> {
        let (_, value) = toggle.assignment();
        let sql = toggle.sql();
        let addon = sqlx::query_as::<_, Addon>(&sql)
            .bind(id)
            .bind(value)
            .fetch_one(self.pool())
            .await?;
        Ok(addon)
    }

    /// (addon_id, user_id) 기준 upsert
    pub async fn configure_addon(&self, addon_id: Uuid, user_id: Uuid, config: &Value) -> Result<AddonConfig> {
        let addon_config = sqlx::query_as::<_, AddonConfig>(
            r#"
            INSERT INTO addon_configs (addon_id, user_id, config, enabled)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (addon_id, user_id)
            DO UPDATE SET config = EXCLUDED.config
            RETURNING *
            "#,
        )
        .bind(addon_id)
        .bind(user_id)
        .bind(config)
        .fetch_one(self.pool())
        .await?;
        Ok(addon_config)
    }

    /// user_id 가 없으면 해당 애드온의 첫 설정
    pub async fn get_addon_config(&self, addon_id: Uuid, user_id: Option<Uuid>) -> Result<Option<AddonConfig>> {
        let addon_config = sqlx::query_as::<_, AddonConfig>(
            r#"
            SELECT * FROM addon_configs
            WHERE addon_id = $1 AND ($2::uuid IS NULL OR user_id = $2)
            ORDER BY created_at
            LIMIT 1
            "#,
        )
        .bind(addon_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(addon_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_parse() {
        assert_eq!(AddonToggle::parse("install"), Some(AddonToggle::Install));
        assert_eq!(AddonToggle::parse("disable"), Some(AddonToggle::Disable));
        assert_eq!(AddonToggle::parse("delete"), None);
    }

    #[test]
    fn test_toggle_touches_one_column() {
        assert_eq!(
            AddonToggle::Uninstall.sql(),
            "UPDATE addons SET installed = $2, updated_at = NOW() WHERE id = $1 RETURNING *"
        );
        assert_eq!(AddonToggle::Uninstall.assignment(), ("installed", false));
        assert_eq!(AddonToggle::Enable.assignment(), ("enabled", true));
    }
}
