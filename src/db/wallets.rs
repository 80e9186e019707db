//! 지갑 커넥터

use anyhow::Result;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{Database, WalletConnector};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WalletConnectorUpdate {
    pub enabled: Option<bool>,
    pub config: Option<Value>,
}

/// 커넥터 RPC 설정 JSON
pub(crate) fn rpc_config(rpc_endpoint: &str, fallback_rpc: Option<&str>) -> Value {
    json!({
        "rpc_endpoint": rpc_endpoint,
        "fallback_rpc": fallback_rpc,
    })
}

impl Database {
    pub async fn list_wallet_connectors(&self) -> Result<Vec<WalletConnector>> {
        let connectors = sqlx::query_as::<_, WalletConnector>("SELECT * FROM wallet_connectors ORDER BY name")
            .fetch_all(self.pool())
            .await?;
        Ok(connectors)
    }

    pub async fn update_wallet_connector(&self, id: Uuid, update: &WalletConnectorUpdate) -> Result<WalletConnector> {
        let connector = sqlx::query_as::<_, WalletConnector>(
            r#"
            UPDATE wallet_connectors SET
                enabled = COALESCE($2, enabled),
                config = COALESCE($3, config),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.enabled)
        .bind(&update.config)
        .fetch_one(self.pool())
        .await?;
        Ok(connector)
    }

    /// config 전체를 `{rpc_endpoint, fallback_rpc}` 로 교체
    pub async fn set_connector_rpc(
        &self,
        id: Uuid,
        rpc_endpoint: &str,
        fallback_rpc: Option<&str>,
    ) -> Result<WalletConnector> {
        let update = WalletConnectorUpdate {
            enabled: None,
            config: Some(rpc_config(rpc_endpoint, fallback_rpc)),
        };
        self.update_wallet_connector(id, &update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_config_shape() {
        assert_eq!(
            rpc_config("https://a", Some("https://b")),
            json!({"rpc_endpoint": "https://a", "fallback_rpc": "https://b"})
        );
        assert_eq!(
            rpc_config("https://a", None),
            json!({"rpc_endpoint": "https://a", "fallback_rpc": null})
        );
    }
}
