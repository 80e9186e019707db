//! Admin Routes
//!
//! `/api/admin/*` 전체가 admin gate 뒤에 위치.
//! 핸들러는 `Extension<AdminContext>` 로 인증된 관리자를 받아 감사 로그에 기록
//!
//! # Design Decision
//!
//! 감사 로그 기록 실패는 요청을 실패시키지 않음 (`Database::record_audit`)

pub mod addons;
pub mod agents;
pub mod analytics;
pub mod billing;
pub mod deploy;
pub mod fees;
pub mod logs;
pub mod oracles;
pub mod rpc;
pub mod sdk;
pub mod settings;
pub mod users;
pub mod wallets;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use serde_json::Value;

use crate::db::audit::NewAuditEntry;
use crate::middleware::AdminContext;
use crate::AppState;

/// 관리자 라우터 (gate 는 호출 측에서 route_layer 로 적용)
pub fn router() -> Router<AppState> {
    Router::new()
        // Dashboard
        .route("/stats", get(analytics::get_stats))
        .route("/tokens", get(analytics::get_tokens))
        .route("/transactions", get(analytics::list_transactions))
        // Users
        .route("/users", get(users::list_users))
        .route(
            "/users/:id",
            get(users::get_user).put(users::update_user).patch(users::patch_user),
        )
        .route("/users/:id/credits", post(users::adjust_credits))
        .route("/users/:id/plan", post(users::adjust_plan))
        .route("/users/:id/freeze", post(users::freeze_account))
        .route("/users/:id/unfreeze", post(users::unfreeze_account))
        .route("/users/:id/ban", post(users::ban_account))
        .route("/users/:id/usage", get(users::get_usage))
        .route("/users/:id/billing", get(users::get_billing_history))
        // Agents
        .route("/agents", get(agents::list_agents).post(agents::create_agent))
        .route("/agents/import", post(agents::import_agent_config))
        .route(
            "/agents/:id",
            get(agents::get_agent).put(agents::update_agent).delete(agents::delete_agent),
        )
        .route("/agents/:id/pause", post(agents::pause_agent))
        .route("/agents/:id/resume", post(agents::resume_agent))
        .route("/agents/:id/run", post(agents::run_agent_once))
        .route("/agents/:id/reset", post(agents::reset_agent_state))
        .route("/agents/:id/tools", post(agents::attach_tool))
        .route("/agents/:id/skills", post(agents::attach_skill))
        .route("/agents/:id/pipelines", post(agents::attach_pipeline))
        .route(
            "/agents/:id/schedule",
            put(agents::set_schedule).delete(agents::disable_schedule),
        )
        .route("/agents/:id/export", get(agents::export_agent_config))
        // Billing
        .route("/billing/plans", get(billing::list_plans).post(billing::create_plan))
        .route(
            "/billing/plans/:id",
            put(billing::update_plan).delete(billing::delete_plan),
        )
        .route("/billing/invoices", get(billing::list_invoices))
        .route("/billing/invoices/:id/refund", post(billing::refund_payment))
        .route("/billing/checkout", post(billing::create_checkout))
        .route("/billing/crypto", post(billing::create_crypto_payment_request))
        .route("/billing/crypto/verify", post(billing::verify_crypto_payment))
        // Fees
        .route("/fees", get(fees::list_fees))
        .route("/fees/overrides", get(fees::list_fee_overrides))
        .route("/fees/overrides/agent/:id", put(fees::set_agent_fee_override))
        .route("/fees/overrides/user/:id", put(fees::set_user_fee_override))
        .route("/fees/overrides/:id", delete(fees::delete_fee_override))
        .route("/fees/:fee_type", put(fees::update_fee))
        // Oracles
        .route("/oracles", get(oracles::list_oracles))
        .route("/oracles/feeds", get(oracles::list_feeds).post(oracles::create_feed))
        .route(
            "/oracles/feeds/:id",
            put(oracles::update_feed).delete(oracles::delete_feed),
        )
        .route("/oracles/feeds/:id/price", post(oracles::override_price))
        .route("/oracles/:id", put(oracles::update_oracle))
        // RPC
        .route("/rpc", get(rpc::list_rpc_endpoints).post(rpc::create_rpc))
        .route("/rpc/:id", put(rpc::update_rpc).delete(rpc::delete_rpc))
        .route("/rpc/:id/health", post(rpc::check_rpc_health))
        // Wallets
        .route("/wallets", get(wallets::list_wallet_connectors))
        .route("/wallets/:id", put(wallets::update_wallet_connector))
        .route("/wallets/:id/rpc", put(wallets::set_rpc_endpoint))
        // Addons
        .route("/addons", get(addons::list_addons))
        .route(
            "/addons/:id/config",
            get(addons::get_addon_config).put(addons::configure_addon),
        )
        .route("/addons/:id/:action", post(addons::toggle_addon))
        // SDK
        .route("/sdk/keys", get(sdk::list_api_keys).post(sdk::create_api_key))
        .route("/sdk/keys/:id", delete(sdk::delete_api_key))
        .route("/sdk/keys/:id/revoke", post(sdk::revoke_api_key))
        .route("/sdk/keys/:id/rate-limits", put(sdk::update_api_key_rate_limits))
        .route("/sdk/keys/:id/billing", put(sdk::update_api_key_billing))
        .route("/sdk/configs", get(sdk::list_sdk_configs))
        .route("/sdk/configs/:sdk_type", put(sdk::update_sdk_config))
        // Audit logs
        .route("/logs", get(logs::get_audit_logs).post(logs::log_audit_event))
        // Settings
        .route("/settings", get(settings::get_settings).post(settings::update_settings))
        .route(
            "/settings/entries",
            get(settings::list_settings).post(settings::create_setting),
        )
        .route(
            "/settings/entries/:key",
            get(settings::get_setting).put(settings::update_setting),
        )
        // Deploy
        .route("/deploy/validate", post(deploy::validate_config))
        .route("/deploy/database", get(deploy::check_database_connection))
        .route("/deploy/migrate", post(deploy::run_migrations))
}

/// 관리자 작업 감사 로그 (실패해도 요청은 계속)
pub(crate) async fn audit(
    state: &AppState,
    ctx: &AdminContext,
    action: &str,
    resource_type: &str,
    resource_id: impl ToString,
    details: Value,
) {
    let entry = NewAuditEntry {
        resource_id: Some(resource_id.to_string()),
        details: Some(details).filter(|d| !d.is_null()),
        ..ctx.audit(action, resource_type)
    };
    state.db.record_audit(&entry).await;
}
