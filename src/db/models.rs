//! Database Models
//!
//! 호스팅 DB 테이블을 그대로 옮긴 row 구조체.
//! enum 성격의 컬럼은 TEXT(String), 중첩 설정은 JSONB(serde_json::Value)로 보관.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// 플랫폼 사용자 (`users`)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub wallet_address: Option<String>,
    /// free | pro | enterprise
    pub plan: String,
    pub credits: i64,
    /// { requests_per_minute, requests_per_hour, requests_per_day }
    pub rate_limits: Value,
    /// active | suspended | banned
    pub status: String,
    /// user | admin | super_admin
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// AI 에이전트 (`agents`)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Agent {
    pub id: Uuid,
    pub name: String,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub agent_type: String,
    pub status: String,
    pub description: Option<String>,
    pub avatar_url: Option<String>,
    pub model: String,
    pub temperature: f64,
    pub max_tokens: i32,
    pub memory: String,
    /// { retries, timeout_ms, concurrency, memory_limit }
    pub config: Value,
    /// { daily_calls, monthly_calls, per_user_limit }
    pub limits: Value,
    /// { cost_per_call, cost_per_token }
    pub billing: Value,
    pub configuration_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentTool {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub tool_name: String,
    pub tool_config: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentSkill {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub skill_name: String,
    pub skill_config: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentPipelineStep {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub step_order: i32,
    pub step_name: String,
    pub step_config: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AgentSchedule {
    pub id: Uuid,
    pub agent_id: Uuid,
    pub cron: String,
    pub timezone: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct BillingPlan {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub price_monthly: f64,
    pub price_yearly: f64,
    pub credits_included: i64,
    /// string[]
    pub features: Value,
    pub limits: Value,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Invoice {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub plan_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Fee {
    pub id: Uuid,
    /// base | network | agent | priority
    pub fee_type: String,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub description: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeeOverride {
    pub id: Uuid,
    pub agent_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub fee_type: String,
    pub amount: f64,
    pub percentage: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WalletConnector {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub connector_type: String,
    pub enabled: bool,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PriceOracle {
    pub id: Uuid,
    pub name: String,
    pub oracle_type: String,
    pub enabled: bool,
    pub priority: i32,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OracleFeed {
    pub id: Uuid,
    pub oracle_id: Uuid,
    pub symbol: String,
    pub feed_id: String,
    pub token_address: Option<String>,
    pub refresh_interval_seconds: i32,
    pub enabled: bool,
    pub last_price: Option<f64>,
    pub last_updated: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RpcEndpoint {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    /// mainnet-beta | devnet | testnet
    pub network: String,
    /// http | websocket
    pub endpoint_type: String,
    pub priority: i32,
    pub enabled: bool,
    pub rate_limit: i32,
    pub proxy_mode: bool,
    /// healthy | unhealthy | unknown
    pub health_status: String,
    pub last_health_check: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Addon {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    pub addon_type: String,
    pub version: String,
    pub enabled: bool,
    pub installed: bool,
    pub config_schema: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AddonConfig {
    pub id: Uuid,
    pub addon_id: Uuid,
    pub user_id: Uuid,
    pub config: Value,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// API key (`api_keys`)
///
/// 평문 키는 저장하지 않음: sha256 해시와 앞 10글자 prefix만 보관
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(skip_serializing)]
    pub key_hash: String,
    pub key_prefix: String,
    pub name: String,
    pub scopes: Value,
    /// { requests_per_minute, requests_per_hour }
    pub rate_limits: Value,
    pub billing_config: Value,
    pub enabled: bool,
    pub last_used: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct SdkConfig {
    pub id: Uuid,
    pub sdk_type: String,
    pub version: String,
    pub endpoint: Option<String>,
    pub enabled: bool,
    pub config: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub action: String,
    pub resource_type: String,
    pub resource_id: Option<String>,
    pub details: Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// success | failure | error
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PlatformSetting {
    pub id: Uuid,
    pub setting_key: String,
    pub setting_value: Value,
    pub setting_type: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub updated_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 온체인 트랜잭션 기록 (`transactions`)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub tx_type: String,
    pub status: String,
    pub amount: f64,
    pub token: Option<String>,
    pub signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 토큰 보유 row (관리자 토큰 집계용 컬럼만)
#[derive(Debug, Clone, FromRow)]
pub struct TokenHolding {
    pub token_address: String,
    pub token_symbol: String,
    pub balance: f64,
    pub value_usd: f64,
}
