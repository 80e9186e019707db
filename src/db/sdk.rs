//! API key 및 SDK 설정

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, ApiKey, Database, SdkConfig};

/// API key 생성 입력 (평문 키는 호출자가 생성)
#[derive(Debug, Clone, Deserialize)]
pub struct NewApiKey {
    pub user_id: Uuid,
    pub name: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
    #[serde(default = "default_key_rate_limits")]
    pub rate_limits: Value,
    pub expires_at: Option<DateTime<Utc>>,
}

pub fn default_scopes() -> Vec<String> {
    vec!["read".to_string()]
}

pub fn default_key_rate_limits() -> Value {
    json!({ "requests_per_minute": 60, "requests_per_hour": 1000 })
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SdkConfigUpdate {
    pub version: Option<String>,
    pub endpoint: Option<String>,
    pub enabled: Option<bool>,
    pub config: Option<Value>,
}

pub(crate) fn list_api_keys_query<'a>(user_id: Option<Uuid>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM api_keys WHERE TRUE");
    push_eq(&mut qb, "user_id", user_id);
    qb.push(" ORDER BY created_at DESC");
    qb
}

impl Database {
    pub async fn list_api_keys(&self, user_id: Option<Uuid>) -> Result<Vec<ApiKey>> {
        let keys = list_api_keys_query(user_id)
            .build_query_as::<ApiKey>()
            .fetch_all(self.pool())
            .await?;
        Ok(keys)
    }

    /// 해시/프리픽스만 저장
    pub async fn insert_api_key(&self, input: &NewApiKey, key_hash: &str, key_prefix: &str) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            INSERT INTO api_keys (user_id, key_hash, key_prefix, name, scopes, rate_limits, expires_at, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(input.user_id)
        .bind(key_hash)
        .bind(key_prefix)
        .bind(&input.name)
        .bind(json!(input.scopes))
        .bind(&input.rate_limits)
        .bind(input.expires_at)
        .fetch_one(self.pool())
        .await?;
        Ok(key)
    }

    pub async fn revoke_api_key(&self, id: Uuid) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>("UPDATE api_keys SET enabled = FALSE WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(key)
    }

    pub async fn delete_api_key(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn update_api_key_rate_limits(&self, id: Uuid, rate_limits: &Value) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>("UPDATE api_keys SET rate_limits = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(rate_limits)
            .fetch_one(self.pool())
            .await?;
        Ok(key)
    }

    pub async fn update_api_key_billing(&self, id: Uuid, billing_config: &Value) -> Result<ApiKey> {
        let key = sqlx::query_as::<_, ApiKey>("UPDATE api_keys SET billing_config = $2 WHERE id = $1 RETURNING *")
            .bind(id)
            .bind(billing_config)
            .fetch_one(self.pool())
            .await?;
        Ok(key)
    }

    pub async fn list_sdk_configs(&self) -> Result<Vec<SdkConfig>> {
        let configs = sqlx::query_as::<_, SdkConfig>("SELECT * FROM sdk_configs ORDER BY sdk_type")
            .fetch_all(self.pool())
            .await?;
        Ok(configs)
    }

    pub async fn update_sdk_config(&self, sdk_type: &str, update: &SdkConfigUpdate) -> Result<SdkConfig> {
        let config = sqlx::query_as::<_, SdkConfig>(
            r#"
            UPDATE sdk_configs SET
                version = COALESCE($2, version),
                endpoint = COALESCE($3, endpoint),
                enabled = COALESCE($4, enabled),
                config = COALESCE($5, config),
                updated_at = NOW()
            WHERE sdk_type = $1
            RETURNING *
            "#,
        )
        .bind(sdk_type)
        .bind(&update.version)
        .bind(&update.endpoint)
        .bind(update.enabled)
        .bind(&update.config)
        .fetch_one(self.pool())
        .await?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_api_key_defaults() {
        let input: NewApiKey = serde_json::from_str(&format!(
            r#"{{"user_id":"{}","name":"ci"}}"#,
            Uuid::nil()
        ))
        .unwrap();
        assert_eq!(input.scopes, vec!["read"]);
        assert_eq!(input.rate_limits["requests_per_minute"], 60);
        assert_eq!(input.rate_limits["requests_per_hour"], 1000);
        assert!(input.expires_at.is_none());
    }

    #[test]
    fn test_list_api_keys_query() {
        assert_eq!(
            list_api_keys_query(Some(Uuid::nil())).sql(),
            "SELECT * FROM api_keys WHERE TRUE AND user_id = $1 ORDER BY created_at DESC"
        );
    }
}
