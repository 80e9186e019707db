//! RPC 엔드포인트

use anyhow::Result;
use serde::Deserialize;
use sqlx::{Postgres, QueryBuilder};
use uuid::Uuid;

use super::{push_eq, Database, RpcEndpoint};
use crate::types::{EndpointType, HealthStatus, Network};

#[derive(Debug, Clone, Deserialize)]
pub struct NewRpcEndpoint {
    pub name: String,
    pub url: String,
    pub network: Network,
    pub endpoint_type: EndpointType,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_rate_limit")]
    pub rate_limit: i32,
    #[serde(default)]
    pub proxy_mode: bool,
}

fn default_rate_limit() -> i32 {
    100
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcEndpointUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    pub priority: Option<i32>,
    pub enabled: Option<bool>,
    pub rate_limit: Option<i32>,
    pub proxy_mode: Option<bool>,
}

pub(crate) fn list_rpc_query<'a>(network: Option<String>) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new("SELECT * FROM rpc_endpoints WHERE TRUE");
    push_eq(&mut qb, "network", network);
    qb.push(" ORDER BY priority DESC");
    qb
}

impl Database {
    pub async fn list_rpc_endpoints(&self, network: Option<String>) -> Result<Vec<RpcEndpoint>> {
        let endpoints = list_rpc_query(network)
            .build_query_as::<RpcEndpoint>()
            .fetch_all(self.pool())
            .await?;
        Ok(endpoints)
    }

    pub async fn get_rpc_endpoint(&self, id: Uuid) -> Result<RpcEndpoint> {
        let endpoint = sqlx::query_as::<_, RpcEndpoint>("SELECT * FROM rpc_endpoints WHERE id = $1")
            .bind(id)
            .fetch_one(self.pool())
            .await?;
        Ok(endpoint)
    }

    pub async fn create_rpc_endpoint(&self, input: &NewRpcEndpoint) -> Result<RpcEndpoint> {
        let endpoint = sqlx::query_as::<_, RpcEndpoint>(
            r#"
            INSERT INTO rpc_endpoints (name, url, network, endpoint_type, priority, rate_limit, proxy_mode, enabled)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.url)
        .bind(input.network.as_str())
        .bind(input.endpoint_type.as_str())
        .bind(input.priority)
        .bind(input.rate_limit)
        .bind(input.proxy_mode)
        .fetch_one(self.pool())
        .await?;
        Ok(endpoint)
    }

    pub async fn update_rpc_endpoint(&self, id: Uuid, update: &RpcEndpointUpdate) -> Result<RpcEndpoint> {
        let endpoint = sqlx::query_as::<_, RpcEndpoint>(
            r#"
            UPDATE rpc_endpoints SET
                name = COALESCE($2, name),
                url = COALESCE($3, url),
                priority = COALESCE($4, priority),
                enabled = COALESCE($5, enabled),
                rate_limit = COALESCE($6, rate_limit),
                proxy_mode = COALESCE($7, proxy_mode),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&update.name)
        .bind(&update.url)
        .bind(update.priority)
        .bind(update.enabled)
        .bind(update.rate_limit)
        .bind(update.proxy_mode)
        .fetch_one(self.pool())
        .await?;
        Ok(endpoint)
    }

    pub async fn delete_rpc_endpoint(&self, id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM rpc_endpoints WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    /// 헬스체크 결과 기록 (last_health_check = NOW())
    pub async fn record_rpc_health(&self, id: Uuid, status: HealthStatus) -> Result<RpcEndpoint> {
        let endpoint = sqlx::query_as::<_, RpcEndpoint>(
            r#"
            UPDATE rpc_endpoints SET health_status = $2, last_health_check = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_one(self.pool())
        .await?;
        Ok(endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_rpc_query_orders_by_priority_desc() {
        assert_eq!(
            list_rpc_query(None).sql(),
            "SELECT * FROM rpc_endpoints WHERE TRUE ORDER BY priority DESC"
        );
        assert_eq!(
            list_rpc_query(Some("devnet".to_string())).sql(),
            "SELECT * FROM rpc_endpoints WHERE TRUE AND network = $1 ORDER BY priority DESC"
        );
    }

    #[test]
    fn test_new_endpoint_defaults() {
        let input: NewRpcEndpoint = serde_json::from_str(
            r#"{"name":"helius","url":"https://rpc.example","network":"mainnet-beta","endpoint_type":"http"}"#,
        )
        .unwrap();
        assert_eq!(input.priority, 0);
        assert_eq!(input.rate_limit, 100);
        assert!(!input.proxy_mode);
    }

    #[test]
    fn test_unknown_network_rejected() {
        let result = serde_json::from_str::<NewRpcEndpoint>(
            r#"{"name":"x","url":"u","network":"localnet","endpoint_type":"http"}"#,
        );
        assert!(result.is_err());
    }
}
