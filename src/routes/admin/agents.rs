//! Admin: 에이전트 관리
//!
//! CRUD + 상태 제어(pause/resume/run/reset) + 부속 설정(tools, skills, pipelines, schedule)
//! + export/import

use axum::{
    extract::{Extension, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::db::{
    agents::{AgentFilter, AgentImport, AgentUpdate, NewAgent},
    audit::NewAuditEntry,
    Agent, AgentPipelineStep, AgentSchedule, AgentSkill, AgentTool,
};
use crate::error::ApiError;
use crate::middleware::AdminContext;
use crate::routes::{deleted, required, ApiJson, ApiPath, ApiQuery, MessageResponse};
use crate::types::{text_filter, AgentStatus};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AgentListQuery {
    #[serde(rename = "type")]
    pub agent_type: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AttachToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub tool_config: Value,
}

#[derive(Debug, Deserialize)]
pub struct AttachSkillRequest {
    pub skill_name: String,
    #[serde(default)]
    pub skill_config: Value,
}

#[derive(Debug, Deserialize)]
pub struct AttachPipelineRequest {
    pub step_order: i32,
    pub step_name: String,
    #[serde(default)]
    pub step_config: Value,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleRequest {
    pub cron: Option<String>,
    pub timezone: Option<String>,
}

/// 실행 가능 여부 (active 만 실행)
pub fn ensure_runnable(agent: &Agent) -> Result<(), ApiError> {
    match agent.status.parse::<AgentStatus>() {
        Ok(AgentStatus::Active) => Ok(()),
        _ => Err(ApiError::BadRequest("Agent must be active to run".to_string())),
    }
}

/// GET /api/admin/agents
pub async fn list_agents(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AgentListQuery>,
) -> Result<Json<Vec<Agent>>, ApiError> {
    let filter = AgentFilter {
        agent_type: text_filter(query.agent_type.as_deref()),
        status: text_filter(query.status.as_deref()),
    };
    Ok(Json(state.db.list_agents(filter).await?))
}

/// POST /api/admin/agents
pub async fn create_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(input): ApiJson<NewAgent>,
) -> Result<Json<Agent>, ApiError> {
    if required(Some(input.name.as_str())).is_none() {
        return Err(ApiError::BadRequest("Agent name is required".to_string()));
    }
    let agent = state.db.create_agent(&input).await?;

    super::audit(&state, &ctx, "create_agent", "agent", agent.id, json!({ "name": agent.name })).await;
    tracing::info!(agent_id = %agent.id, name = %agent.name, "Agent created");
    Ok(Json(agent))
}

/// GET /api/admin/agents/:id
pub async fn get_agent(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Agent>, ApiError> {
    Ok(Json(state.db.get_agent(id).await?))
}

/// PUT /api/admin/agents/:id
pub async fn update_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(update): ApiJson<AgentUpdate>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state.db.update_agent(id, &update).await?;
    super::audit(&state, &ctx, "update_agent", "agent", id, Value::Null).await;
    Ok(Json(agent))
}

/// DELETE /api/admin/agents/:id
pub async fn delete_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let rows = state.db.delete_agent(id).await?;
    let response = deleted(rows, "Agent")?;
    super::audit(&state, &ctx, "delete_agent", "agent", id, Value::Null).await;
    Ok(response)
}

/// POST /api/admin/agents/:id/pause
pub async fn pause_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state.db.set_agent_status(id, AgentStatus::Paused).await?;
    super::audit(&state, &ctx, "pause_agent", "agent", id, Value::Null).await;
    Ok(Json(agent))
}

/// POST /api/admin/agents/:id/resume
pub async fn resume_agent(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state.db.set_agent_status(id, AgentStatus::Active).await?;
    super::audit(&state, &ctx, "resume_agent", "agent", id, Value::Null).await;
    Ok(Json(agent))
}

/// POST /api/admin/agents/:id/run
///
/// 실행 요청만 기록 (실제 실행은 워커 측)
pub async fn run_agent_once(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let agent = state.db.get_agent(id).await?;
    ensure_runnable(&agent)?;

    let entry = NewAuditEntry {
        agent_id: Some(agent.id),
        resource_id: Some(agent.id.to_string()),
        ..ctx.audit("run_agent", "agent")
    };
    state.db.record_audit(&entry).await;
    tracing::info!(agent_id = %agent.id, "Agent execution triggered");

    Ok(Json(MessageResponse::ok(format!(
        "Agent {} execution triggered",
        agent.name
    ))))
}

/// POST /api/admin/agents/:id/reset
///
/// configuration_id 가 있으면 메모리 삭제 후 active 로 복귀
pub async fn reset_agent_state(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state.db.get_agent(id).await?;

    let cleared = match agent.configuration_id {
        Some(configuration_id) => state.db.clear_agent_memory(configuration_id).await?,
        None => 0,
    };
    let agent = state.db.set_agent_status(id, AgentStatus::Active).await?;

    super::audit(&state, &ctx, "reset_agent", "agent", id, json!({ "memory_cleared": cleared })).await;
    Ok(Json(agent))
}

/// POST /api/admin/agents/:id/tools
pub async fn attach_tool(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AttachToolRequest>,
) -> Result<Json<AgentTool>, ApiError> {
    Ok(Json(state.db.attach_tool(id, &req.tool_name, &req.tool_config).await?))
}

/// POST /api/admin/agents/:id/skills
pub async fn attach_skill(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AttachSkillRequest>,
) -> Result<Json<AgentSkill>, ApiError> {
    Ok(Json(state.db.attach_skill(id, &req.skill_name, &req.skill_config).await?))
}

/// POST /api/admin/agents/:id/pipelines
pub async fn attach_pipeline(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<AttachPipelineRequest>,
) -> Result<Json<AgentPipelineStep>, ApiError> {
    let step = state
        .db
        .attach_pipeline(id, req.step_order, &req.step_name, &req.step_config)
        .await?;
    Ok(Json(step))
}

/// PUT /api/admin/agents/:id/schedule
pub async fn set_schedule(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<ScheduleRequest>,
) -> Result<Json<AgentSchedule>, ApiError> {
    let cron = required(req.cron.as_deref())
        .ok_or_else(|| ApiError::BadRequest("cron is required".to_string()))?;
    let timezone = required(req.timezone.as_deref()).unwrap_or("UTC");
    Ok(Json(state.db.set_schedule(id, cron, timezone).await?))
}

/// DELETE /api/admin/agents/:id/schedule
pub async fn disable_schedule(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.db.disable_schedule(id).await?;
    Ok(Json(MessageResponse::ok("Schedule disabled")))
}

/// GET /api/admin/agents/:id/export
///
/// 들여쓰기된 JSON 문서
pub async fn export_agent_config(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let export = state.db.export_agent(id).await?;
    let body = serde_json::to_string_pretty(&export).map_err(|e| {
        tracing::error!(error = %e, "Agent export serialization failed");
        ApiError::InternalError
    })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], body))
}

/// POST /api/admin/agents/import
pub async fn import_agent_config(
    State(state): State<AppState>,
    Extension(ctx): Extension<AdminContext>,
    ApiJson(import): ApiJson<AgentImport>,
) -> Result<Json<Agent>, ApiError> {
    let agent = state.db.import_agent(&import).await?;
    super::audit(&state, &ctx, "import_agent", "agent", agent.id, json!({ "name": agent.name })).await;
    Ok(Json(agent))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use chrono::Utc;

    fn agent(status: &str) -> Agent {
        Agent {
            id: Uuid::new_v4(),
            name: "crawler-1".to_string(),
            agent_type: "crawler".to_string(),
            status: status.to_string(),
            description: None,
            avatar_url: None,
            model: "gpt-4".to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            memory: "short".to_string(),
            config: NewAgent::default_config(),
            limits: NewAgent::default_limits(),
            billing: NewAgent::default_billing(),
            configuration_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_only_active_agents_run() {
        assert!(ensure_runnable(&agent("active")).is_ok());

        for status in ["paused", "error"] {
            let err = ensure_runnable(&agent(status)).unwrap_err();
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
            assert_eq!(err.to_string(), "Invalid request: Agent must be active to run");
        }
    }

    #[test]
    fn test_import_document_shape() {
        let import: AgentImport = serde_json::from_value(json!({
            "agent": { "name": "copy", "type": "worker" },
            "tools": [{ "tool_name": "search", "tool_config": { "depth": 2 } }],
            "pipelines": [{ "step_order": 1, "step_name": "fetch" }],
            "schedule": { "cron": "0 * * * *" }
        }))
        .unwrap();

        assert_eq!(import.tools.len(), 1);
        assert!(import.skills.is_empty());
        assert_eq!(
            import.schedule.as_ref().and_then(|s| s.cron_and_timezone()),
            Some(("0 * * * *", "UTC"))
        );
    }
}
